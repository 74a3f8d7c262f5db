//! Error types for frame construction, filtering and cross-frame operations.

use std::fmt;

use thiserror::Error;

use crate::data::model::{Column, TimeseriesKey};

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a binary operation an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSide {
    /// The frame the operation was called on.
    Left,
    /// The frame passed as argument.
    Right,
}

impl fmt::Display for OperandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandSide::Left => write!(f, "self"),
            OperandSide::Right => write!(f, "other"),
        }
    }
}

/// A (model, scenario) pair, rendered the way conflict reports list them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioKey {
    pub model: String,
    pub scenario: String,
}

impl ScenarioKey {
    pub fn new(model: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', '{}')", self.model, self.scenario)
    }
}

/// Errors raised by the core. All of them are reported before any result is built.
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate key {key} with conflicting values {first} and {second}")]
    DuplicateKey {
        key: Box<TimeseriesKey>,
        first: f64,
        second: f64,
    },

    #[error("unknown column `{0}`")]
    InvalidColumn(String),

    #[error("subtraction is only defined between two frames, got {0}")]
    UnsupportedOperand(&'static str),

    #[error("`{operand}` contains more than one `{column}`")]
    AmbiguousGrouping { operand: OperandSide, column: Column },

    #[error("conflict in `meta` for scenarios [{}]", format_keys(.keys))]
    MetaConflict { keys: Vec<ScenarioKey> },

    #[error("invalid filter pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid year `{0}`")]
    InvalidYear(String),

    #[error("invalid value `{value}` for meta column `{column}`")]
    InvalidMetaValue { column: String, value: String },
}

fn format_keys(keys: &[ScenarioKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
