use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{Column, KeyValue, TimeseriesKey, TimeseriesRecord};
use crate::error::{Error, Result, ScenarioKey};

// ---------------------------------------------------------------------------
// TimeseriesStore – the long view
// ---------------------------------------------------------------------------

/// A set of timeseries records with unique six-field keys.
///
/// Stores never change once built; every transformation returns a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeseriesStore {
    records: BTreeMap<TimeseriesKey, f64>,
}

impl TimeseriesStore {
    /// Build a store from long-format rows.
    ///
    /// Repeated keys carrying the same value collapse into one record; a
    /// repeated key with a different value is a [`Error::DuplicateKey`].
    pub fn from_records<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = TimeseriesRecord>,
    {
        let mut records = BTreeMap::new();
        for TimeseriesRecord { key, value } in rows {
            match records.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(slot) => {
                    let first: f64 = *slot.get();
                    // 0.0 and -0.0 agree, as do two NaNs.
                    if first != value && !(first.is_nan() && value.is_nan()) {
                        return Err(Error::DuplicateKey {
                            key: Box::new(slot.key().clone()),
                            first,
                            second: value,
                        });
                    }
                }
            }
        }
        log::debug!("built timeseries store with {} records", records.len());
        Ok(Self { records })
    }

    /// Records in key order, produced lazily.
    pub fn records(&self) -> impl Iterator<Item = TimeseriesRecord> + '_ {
        self.records
            .iter()
            .map(|(key, value)| TimeseriesRecord::new(key.clone(), *value))
    }

    /// Borrowing iteration over (key, value).
    pub fn iter(&self) -> impl Iterator<Item = (&TimeseriesKey, f64)> + '_ {
        self.records.iter().map(|(k, v)| (k, *v))
    }

    pub fn get(&self, key: &TimeseriesKey) -> Option<f64> {
        self.records.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values of one key column.
    pub fn distinct_values(&self, column: Column) -> BTreeSet<KeyValue> {
        self.records.keys().map(|k| k.get(column)).collect()
    }

    /// Distinct projections of the key set onto `columns`.
    pub fn keys_projected_onto(&self, columns: &[Column]) -> BTreeSet<Vec<KeyValue>> {
        self.records.keys().map(|k| k.project(columns)).collect()
    }

    /// The distinct (model, scenario) pairs present in the store.
    pub fn scenario_keys(&self) -> BTreeSet<ScenarioKey> {
        self.records.keys().map(TimeseriesKey::scenario_key).collect()
    }

    /// A new store holding the records whose key satisfies `keep`.
    pub fn retain_keys<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&TimeseriesKey) -> bool,
    {
        let records = self
            .records
            .iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        Self { records }
    }

    /// Pivot to one row per series with one column per year.
    pub fn pivot(&self) -> WideTable {
        let mut years = BTreeSet::new();
        let mut rows: BTreeMap<SeriesKey, BTreeMap<i64, f64>> = BTreeMap::new();
        for (key, value) in &self.records {
            years.insert(key.year);
            rows.entry(SeriesKey::of(key))
                .or_default()
                .insert(key.year, *value);
        }
        WideTable {
            years: years.into_iter().collect(),
            rows: rows
                .into_iter()
                .map(|(key, values)| WideRow { key, values })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// WideTable – the wide-by-time view
// ---------------------------------------------------------------------------

/// The five non-year key columns identifying one series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
}

impl SeriesKey {
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        region: impl Into<String>,
        variable: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
            region: region.into(),
            variable: variable.into(),
            unit: unit.into(),
        }
    }

    fn of(key: &TimeseriesKey) -> Self {
        Self::new(
            key.model.clone(),
            key.scenario.clone(),
            key.region.clone(),
            key.variable.clone(),
            key.unit.clone(),
        )
    }

    /// The full record key of this series at `year`.
    pub fn at(&self, year: i64) -> TimeseriesKey {
        TimeseriesKey::new(
            self.model.clone(),
            self.scenario.clone(),
            self.region.clone(),
            self.variable.clone(),
            self.unit.clone(),
            year,
        )
    }
}

/// One series of the wide view. Years without a value are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub key: SeriesKey,
    pub values: BTreeMap<i64, f64>,
}

impl WideRow {
    pub fn get(&self, year: i64) -> Option<f64> {
        self.values.get(&year).copied()
    }
}

/// Wide-by-time table: `years` are the column labels in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub years: Vec<i64>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Assemble a table from rows; the year columns are derived from them.
    pub fn from_rows(rows: Vec<WideRow>) -> Self {
        let years: BTreeSet<i64> = rows
            .iter()
            .flat_map(|r| r.values.keys().copied())
            .collect();
        Self {
            years: years.into_iter().collect(),
            rows,
        }
    }

    /// Flatten back into the long view. Only cells that hold a value become
    /// records.
    pub fn unpivot(&self) -> Result<TimeseriesStore> {
        TimeseriesStore::from_records(self.rows.iter().flat_map(|row| {
            row.values
                .iter()
                .map(|(year, value)| TimeseriesRecord::new(row.key.at(*year), *value))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(region: &str, year: i64, value: f64) -> TimeseriesRecord {
        TimeseriesRecord::new(
            TimeseriesKey::new("model_a", "scen_a", region, "Primary Energy", "EJ/yr", year),
            value,
        )
    }

    #[test]
    fn identical_duplicates_collapse() {
        let store =
            TimeseriesStore::from_records(vec![rec("World", 2005, 1.0), rec("World", 2005, 1.0)])
                .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn signed_zeros_and_nans_are_identical_duplicates() {
        let store = TimeseriesStore::from_records(vec![
            rec("World", 2005, 0.0),
            rec("World", 2005, -0.0),
            rec("R5ASIA", 2005, f64::NAN),
            rec("R5ASIA", 2005, f64::NAN),
        ])
        .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn records_yield_long_rows_in_key_order() {
        let store = TimeseriesStore::from_records(vec![
            rec("World", 2010, 6.0),
            rec("R5ASIA", 2010, 3.0),
            rec("World", 2005, 1.0),
        ])
        .unwrap();
        let rows: Vec<_> = store.records().collect();
        assert_eq!(
            rows,
            vec![rec("R5ASIA", 2010, 3.0), rec("World", 2005, 1.0), rec("World", 2010, 6.0)]
        );
    }

    #[test]
    fn conflicting_duplicates_are_rejected() {
        let err =
            TimeseriesStore::from_records(vec![rec("World", 2005, 1.0), rec("World", 2005, 2.0)])
                .unwrap_err();
        match err {
            Error::DuplicateKey { key, first, second } => {
                assert_eq!(key.year, 2005);
                assert_eq!((first, second), (1.0, 2.0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn pivot_does_not_synthesize_missing_cells() {
        let store = TimeseriesStore::from_records(vec![
            rec("World", 2005, 1.0),
            rec("World", 2010, 6.0),
            rec("R5ASIA", 2010, 3.0),
        ])
        .unwrap();
        let wide = store.pivot();
        assert_eq!(wide.years, vec![2005, 2010]);
        assert_eq!(wide.rows.len(), 2);

        let asia = wide
            .rows
            .iter()
            .find(|r| r.key.region == "R5ASIA")
            .unwrap();
        assert_eq!(asia.get(2005), None);
        assert_eq!(asia.get(2010), Some(3.0));

        assert_eq!(wide.unpivot().unwrap(), store);
    }

    #[test]
    fn projections_and_distinct_values() {
        let store = TimeseriesStore::from_records(vec![
            rec("World", 2005, 1.0),
            rec("World", 2010, 6.0),
            rec("R5ASIA", 2010, 3.0),
        ])
        .unwrap();
        let years: Vec<_> = store.distinct_values(Column::Year).into_iter().collect();
        assert_eq!(years, vec![KeyValue::Year(2005), KeyValue::Year(2010)]);

        let regions = store.keys_projected_onto(&[Column::Region, Column::Model]);
        assert_eq!(regions.len(), 2);
        assert!(regions.contains(&vec![
            KeyValue::Text("R5ASIA".into()),
            KeyValue::Text("model_a".into())
        ]));
        assert_eq!(store.scenario_keys().len(), 1);
    }
}
