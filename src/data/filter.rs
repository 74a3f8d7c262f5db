use std::collections::BTreeSet;
use std::ops::{Bound, Range, RangeBounds, RangeInclusive};

use regex::Regex;

use super::model::{Column, KeyValue, TimeseriesKey};
use super::timeseries::TimeseriesStore;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Predicate – what a single column must satisfy
// ---------------------------------------------------------------------------

/// A per-column condition.
///
/// * `Exact` – equality with one value
/// * `AnyOf` – membership in a set of values
/// * `Pattern` – anchored, case-sensitive glob (`*` = any run of characters);
///   the record passes when any of the globs matches
/// * `YearRange` – numeric bounds, meaningful for the `year` column
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Exact(KeyValue),
    AnyOf(BTreeSet<KeyValue>),
    Pattern(Vec<String>),
    YearRange { start: Bound<i64>, end: Bound<i64> },
}

impl Predicate {
    /// Membership over several values. Any entry containing `*` turns the
    /// whole predicate into a pattern match.
    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.iter().any(|v| is_glob(v)) {
            Predicate::Pattern(values)
        } else {
            Predicate::AnyOf(values.into_iter().map(KeyValue::Text).collect())
        }
    }

    /// `|`-separated alternatives, each a literal or a glob.
    ///
    /// Plain strings treat `|` literally since variable names use it as a
    /// hierarchy separator.
    pub fn alternatives(pattern: &str) -> Self {
        Self::any_of(pattern.split('|'))
    }

    /// Several years.
    pub fn years<I>(years: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Predicate::AnyOf(years.into_iter().map(KeyValue::Year).collect())
    }

    /// Any numeric range over years.
    pub fn year_range<R: RangeBounds<i64>>(range: R) -> Self {
        Predicate::YearRange {
            start: range.start_bound().cloned(),
            end: range.end_bound().cloned(),
        }
    }
}

fn is_glob(s: &str) -> bool {
    s.contains('*')
}

impl From<&str> for Predicate {
    fn from(value: &str) -> Self {
        if is_glob(value) {
            Predicate::Pattern(vec![value.to_string()])
        } else {
            Predicate::Exact(KeyValue::Text(value.to_string()))
        }
    }
}

impl From<String> for Predicate {
    fn from(value: String) -> Self {
        Predicate::from(value.as_str())
    }
}

impl From<i64> for Predicate {
    fn from(year: i64) -> Self {
        Predicate::Exact(KeyValue::Year(year))
    }
}

impl From<Vec<&str>> for Predicate {
    fn from(values: Vec<&str>) -> Self {
        Predicate::any_of(values)
    }
}

impl<const N: usize> From<[&str; N]> for Predicate {
    fn from(values: [&str; N]) -> Self {
        Predicate::any_of(values)
    }
}

impl From<Vec<i64>> for Predicate {
    fn from(years: Vec<i64>) -> Self {
        Predicate::years(years)
    }
}

impl From<Range<i64>> for Predicate {
    fn from(range: Range<i64>) -> Self {
        Predicate::year_range(range)
    }
}

impl From<RangeInclusive<i64>> for Predicate {
    fn from(range: RangeInclusive<i64>) -> Self {
        Predicate::year_range(range)
    }
}

// ---------------------------------------------------------------------------
// Compiled matchers
// ---------------------------------------------------------------------------

enum Matcher {
    Exact(KeyValue),
    AnyOf(BTreeSet<KeyValue>),
    Pattern(Vec<Regex>),
    YearRange(Bound<i64>, Bound<i64>),
}

/// Translate a glob into an anchored regex: `*` becomes `.*`, everything
/// else is literal.
fn compile_glob(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Year cells compare equal to their textual form so that `"2010"` selects
/// the year 2010.
fn same_value(expected: &KeyValue, cell: &KeyValue) -> bool {
    match (expected, cell) {
        (KeyValue::Text(t), KeyValue::Year(y)) | (KeyValue::Year(y), KeyValue::Text(t)) => {
            t.trim().parse::<i64>().is_ok_and(|v| v == *y)
        }
        _ => expected == cell,
    }
}

impl Matcher {
    fn compile(predicate: &Predicate) -> Result<Self> {
        Ok(match predicate {
            Predicate::Exact(v) => Matcher::Exact(v.clone()),
            Predicate::AnyOf(vs) => Matcher::AnyOf(vs.clone()),
            Predicate::Pattern(globs) => {
                Matcher::Pattern(globs.iter().map(|g| compile_glob(g)).collect::<Result<_>>()?)
            }
            Predicate::YearRange { start, end } => Matcher::YearRange(*start, *end),
        })
    }

    fn matches(&self, cell: &KeyValue) -> bool {
        match self {
            Matcher::Exact(v) => same_value(v, cell),
            Matcher::AnyOf(vs) => vs.iter().any(|v| same_value(v, cell)),
            Matcher::Pattern(res) => {
                let text = cell.to_string();
                res.iter().any(|re| re.is_match(&text))
            }
            // Ranges never match label columns.
            Matcher::YearRange(start, end) => cell
                .as_year()
                .is_some_and(|y| (*start, *end).contains(&y)),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter – a set of column predicates
// ---------------------------------------------------------------------------

/// Column predicates combined with logical AND.
///
/// With `keep(false)` the filter selects the complement: every record that
/// does not satisfy all of the predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    predicates: Vec<(String, Predicate)>,
    keep: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            keep: true,
        }
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate for the named column. The name is validated when the
    /// filter is applied.
    pub fn with(mut self, column: impl Into<String>, predicate: impl Into<Predicate>) -> Self {
        self.predicates.push((column.into(), predicate.into()));
        self
    }

    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    fn compile(&self) -> Result<Vec<(Column, Matcher)>> {
        self.predicates
            .iter()
            .map(|(name, predicate)| -> Result<(Column, Matcher)> {
                Ok((name.parse()?, Matcher::compile(predicate)?))
            })
            .collect()
    }

    /// Restrict `store` to the selected records.
    pub fn apply(&self, store: &TimeseriesStore) -> Result<TimeseriesStore> {
        let matchers = self.compile()?;
        let all_match = |key: &TimeseriesKey| {
            matchers
                .iter()
                .all(|(column, matcher)| matcher.matches(&key.get(*column)))
        };
        let filtered = store.retain_keys(|key| all_match(key) == self.keep);
        log::debug!(
            "filter (keep={}) selected {} of {} records",
            self.keep,
            filtered.len(),
            store.len()
        );
        Ok(filtered)
    }
}
