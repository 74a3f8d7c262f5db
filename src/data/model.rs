use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ScenarioKey};

// ---------------------------------------------------------------------------
// Column – the fixed key schema of a timeseries record
// ---------------------------------------------------------------------------

/// One of the six key columns identifying a timeseries record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Model,
    Scenario,
    Region,
    Variable,
    Unit,
    Year,
}

impl Column {
    /// All key columns in canonical order.
    pub const ALL: [Column; 6] = [
        Column::Model,
        Column::Scenario,
        Column::Region,
        Column::Variable,
        Column::Unit,
        Column::Year,
    ];

    /// The key columns of the wide view's rows (everything but `year`).
    pub const INDEX: [Column; 5] = [
        Column::Model,
        Column::Scenario,
        Column::Region,
        Column::Variable,
        Column::Unit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Model => "model",
            Column::Scenario => "scenario",
            Column::Region => "region",
            Column::Variable => "variable",
            Column::Unit => "unit",
            Column::Year => "year",
        }
    }

    /// Whether the column is part of the Meta Store's primary key.
    pub fn identifies_meta(self) -> bool {
        matches!(self, Column::Model | Column::Scenario)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidColumn(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// KeyValue – one cell of a key column
// ---------------------------------------------------------------------------

/// The value of a single key column: text for the five label columns, an
/// integer for `year`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Year(i64),
    Text(String),
}

impl KeyValue {
    pub fn as_year(&self) -> Option<i64> {
        match self {
            KeyValue::Year(y) => Some(*y),
            KeyValue::Text(_) => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Year(y) => write!(f, "{y}"),
            KeyValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// TimeseriesKey / TimeseriesRecord
// ---------------------------------------------------------------------------

/// The six-field primary key of a timeseries record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeseriesKey {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
    pub year: i64,
}

impl TimeseriesKey {
    pub fn new(
        model: impl Into<String>,
        scenario: impl Into<String>,
        region: impl Into<String>,
        variable: impl Into<String>,
        unit: impl Into<String>,
        year: i64,
    ) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
            region: region.into(),
            variable: variable.into(),
            unit: unit.into(),
            year,
        }
    }

    /// Read one key column.
    pub fn get(&self, column: Column) -> KeyValue {
        match column {
            Column::Model => KeyValue::Text(self.model.clone()),
            Column::Scenario => KeyValue::Text(self.scenario.clone()),
            Column::Region => KeyValue::Text(self.region.clone()),
            Column::Variable => KeyValue::Text(self.variable.clone()),
            Column::Unit => KeyValue::Text(self.unit.clone()),
            Column::Year => KeyValue::Year(self.year),
        }
    }

    /// Replace one key column with `label`. Fails for `year` if the label
    /// is not an integer.
    pub fn relabel(&mut self, column: Column, label: &str) -> Result<()> {
        match column {
            Column::Model => self.model = label.to_string(),
            Column::Scenario => self.scenario = label.to_string(),
            Column::Region => self.region = label.to_string(),
            Column::Variable => self.variable = label.to_string(),
            Column::Unit => self.unit = label.to_string(),
            Column::Year => {
                self.year = label
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidYear(label.to_string()))?
            }
        }
        Ok(())
    }

    /// Project the key onto a subset of columns, in the given order.
    pub fn project(&self, columns: &[Column]) -> Vec<KeyValue> {
        columns.iter().map(|c| self.get(*c)).collect()
    }

    /// The (model, scenario) pair identifying the record's metadata row.
    pub fn scenario_key(&self) -> ScenarioKey {
        ScenarioKey::new(self.model.clone(), self.scenario.clone())
    }
}

impl fmt::Display for TimeseriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.model, self.scenario, self.region, self.variable, self.unit, self.year
        )
    }
}

/// One row of the long view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    #[serde(flatten)]
    pub key: TimeseriesKey,
    pub value: f64,
}

impl TimeseriesRecord {
    pub fn new(key: TimeseriesKey, value: f64) -> Self {
        Self { key, value }
    }
}

// ---------------------------------------------------------------------------
// MetaValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value.
/// Kept `Ord` so values can live in `BTreeSet`s for distinct-value listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

// -- Manual Eq/Ord so we can put MetaValue in BTreeSet --

impl Eq for MetaValue {}

impl PartialOrd for MetaValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetaValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use MetaValue::*;
        fn discriminant(v: &MetaValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for MetaValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetaValue::String(s) => s.hash(state),
            MetaValue::Integer(i) => i.hash(state),
            MetaValue::Float(f) => f.to_bits().hash(state),
            MetaValue::Bool(b) => b.hash(state),
            MetaValue::Null => {}
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::String(s) => write!(f, "{s}"),
            MetaValue::Integer(i) => write!(f, "{i}"),
            MetaValue::Float(v) => write!(f, "{v}"),
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetaValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            MetaValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Integer(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::String(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("model", Column::Model)]
    #[case("Scenario", Column::Scenario)]
    #[case(" REGION ", Column::Region)]
    #[case("year", Column::Year)]
    fn parses_column_names(#[case] input: &str, #[case] expected: Column) {
        assert_eq!(input.parse::<Column>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_column() {
        let err = "subannual".parse::<Column>().unwrap_err();
        assert!(matches!(err, Error::InvalidColumn(c) if c == "subannual"));
    }

    #[test]
    fn relabel_year_requires_integer() {
        let mut key = TimeseriesKey::new("m", "s", "World", "v", "EJ/yr", 2005);
        key.relabel(Column::Year, "2010").unwrap();
        assert_eq!(key.year, 2010);
        assert!(matches!(
            key.relabel(Column::Year, "later"),
            Err(Error::InvalidYear(_))
        ));
    }

    #[test]
    fn meta_values_order_by_kind_then_value() {
        let mut values = vec![
            MetaValue::from("b"),
            MetaValue::from(2.5),
            MetaValue::Null,
            MetaValue::from(true),
            MetaValue::from("a"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                MetaValue::Null,
                MetaValue::Bool(true),
                MetaValue::Float(2.5),
                MetaValue::from("a"),
                MetaValue::from("b"),
            ]
        );
    }
}
