//! Scenario timeseries frames: model outputs keyed by model, scenario,
//! region, variable, unit and year, with a per-scenario metadata table.

pub mod data;
pub mod error;

pub use data::filter::{Filter, Predicate};
pub use data::frame::Frame;
pub use data::meta::{MetaRow, MetaStore};
pub use data::model::{Column, KeyValue, MetaValue, TimeseriesKey, TimeseriesRecord};
pub use data::ops::{Operand, SubtractOptions};
pub use data::timeseries::{SeriesKey, TimeseriesStore, WideRow, WideTable};
pub use error::{Error, OperandSide, Result, ScenarioKey};
