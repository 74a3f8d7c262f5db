use std::collections::{BTreeMap, BTreeSet};

use super::model::MetaValue;
use crate::error::{Error, Result, ScenarioKey};

/// Name of the mandatory boolean metadata column.
pub const EXCLUDE: &str = "exclude";

/// One metadata row: column name → value.
pub type MetaRow = BTreeMap<String, MetaValue>;

/// The row every newly seen (model, scenario) starts with.
pub fn default_row() -> MetaRow {
    MetaRow::from([(EXCLUDE.to_string(), MetaValue::Bool(false))])
}

/// Per-scenario metadata, keyed by (model, scenario).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaStore {
    rows: BTreeMap<ScenarioKey, MetaRow>,
}

impl MetaStore {
    /// A store with a default row for each key.
    pub fn seeded<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = ScenarioKey>,
    {
        Self {
            rows: keys.into_iter().map(|k| (k, default_row())).collect(),
        }
    }

    /// Rows are taken as given; a missing `exclude` column is filled in.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (ScenarioKey, MetaRow)>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|(key, mut row)| {
                    row.entry(EXCLUDE.to_string())
                        .or_insert(MetaValue::Bool(false));
                    (key, row)
                })
                .collect(),
        }
    }

    /// Recompute the store for a new key set: existing rows for surviving
    /// keys are carried over, vanished keys are dropped and new keys get the
    /// default row.
    pub fn synced_to(&self, keys: &BTreeSet<ScenarioKey>) -> Self {
        Self {
            rows: keys
                .iter()
                .map(|k| {
                    let row = self.rows.get(k).cloned().unwrap_or_else(default_row);
                    (k.clone(), row)
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &ScenarioKey) -> Option<&MetaRow> {
        self.rows.get(key)
    }

    /// A single cell.
    pub fn value(&self, key: &ScenarioKey, column: &str) -> Option<&MetaValue> {
        self.rows.get(key).and_then(|row| row.get(column))
    }

    /// Whether the scenario is flagged as excluded.
    pub fn is_excluded(&self, key: &ScenarioKey) -> bool {
        self.value(key, EXCLUDE)
            .and_then(MetaValue::as_bool)
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScenarioKey, &MetaRow)> + '_ {
        self.rows.iter()
    }

    pub fn keys(&self) -> BTreeSet<ScenarioKey> {
        self.rows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every column name used by at least one row.
    pub fn columns(&self) -> BTreeSet<&str> {
        self.rows
            .values()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect()
    }

    /// Write `value` into `column` for the given keys, or for every row when
    /// `keys` is `None`. Keys without a row are skipped. Returns the number
    /// of rows written.
    pub fn set(
        &mut self,
        column: &str,
        value: MetaValue,
        keys: Option<&[ScenarioKey]>,
    ) -> Result<usize> {
        if column == EXCLUDE && value.as_bool().is_none() {
            return Err(Error::InvalidMetaValue {
                column: column.to_string(),
                value: value.to_string(),
            });
        }
        let written = match keys {
            None => {
                for row in self.rows.values_mut() {
                    row.insert(column.to_string(), value.clone());
                }
                self.rows.len()
            }
            Some(keys) => {
                let mut written = 0;
                for key in keys {
                    match self.rows.get_mut(key) {
                        Some(row) => {
                            row.insert(column.to_string(), value.clone());
                            written += 1;
                        }
                        None => log::warn!("no metadata row for {key}, skipping"),
                    }
                }
                written
            }
        };
        Ok(written)
    }
}
