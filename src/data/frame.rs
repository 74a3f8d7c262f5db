use std::collections::BTreeSet;

use super::filter::Filter;
use super::meta::MetaStore;
use super::model::{Column, KeyValue, MetaValue, TimeseriesRecord};
use super::ops::{self, Operand, SubtractOptions};
use super::timeseries::{TimeseriesStore, WideTable};
use crate::error::{Result, ScenarioKey};

// ---------------------------------------------------------------------------
// Frame – timeseries data plus per-scenario metadata
// ---------------------------------------------------------------------------

/// Timeseries records paired with one metadata row per (model, scenario).
///
/// The metadata key set always equals the set of (model, scenario) pairs in
/// the data. `filter` and `subtract` return new frames and leave `self`
/// untouched; `set_meta` is the only in-place mutation. Clone a frame to
/// get an independent copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    data: TimeseriesStore,
    meta: MetaStore,
}

impl Frame {
    /// Build a frame from long-format rows with default metadata.
    pub fn new<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = TimeseriesRecord>,
    {
        Ok(Self::from_store(TimeseriesStore::from_records(records)?))
    }

    /// Build a frame from the wide-by-time view.
    pub fn from_wide(table: &WideTable) -> Result<Self> {
        Ok(Self::from_store(table.unpivot()?))
    }

    pub fn from_store(data: TimeseriesStore) -> Self {
        let meta = MetaStore::seeded(data.scenario_keys());
        Self { data, meta }
    }

    pub(crate) fn from_parts(data: TimeseriesStore, meta: MetaStore) -> Self {
        debug_assert_eq!(data.scenario_keys(), meta.keys());
        Self { data, meta }
    }

    /// Long view.
    pub fn data(&self) -> &TimeseriesStore {
        &self.data
    }

    pub fn meta(&self) -> &MetaStore {
        &self.meta
    }

    /// Wide-by-time view.
    pub fn timeseries(&self) -> WideTable {
        self.data.pivot()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A new frame restricted to the records selected by `filter`, with
    /// metadata kept for the surviving scenarios only.
    pub fn filter(&self, filter: &Filter) -> Result<Frame> {
        let data = filter.apply(&self.data)?;
        let meta = self.meta.synced_to(&data.scenario_keys());
        Ok(Self::from_parts(data, meta))
    }

    /// Set a metadata column for every scenario in the frame.
    pub fn set_meta(&mut self, value: impl Into<MetaValue>, column: &str) -> Result<()> {
        self.meta.set(column, value.into(), None)?;
        Ok(())
    }

    /// Set a metadata column for the listed scenarios; unknown keys are
    /// skipped.
    pub fn set_meta_for(
        &mut self,
        value: impl Into<MetaValue>,
        column: &str,
        keys: &[ScenarioKey],
    ) -> Result<()> {
        self.meta.set(column, value.into(), Some(keys))?;
        Ok(())
    }

    /// `self - other`, aligned on every key column except `join`; the
    /// result carries `label` in the `join` column.
    ///
    /// Fails if either side holds more than one `join` value for the same
    /// remaining key, or if the operands' metadata disagree (see
    /// [`Frame::subtract_with`]).
    pub fn subtract<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        join: Column,
        label: &str,
    ) -> Result<Frame> {
        self.subtract_with(other, join, label, SubtractOptions::default())
    }

    pub fn subtract_with<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        join: Column,
        label: &str,
        options: SubtractOptions,
    ) -> Result<Frame> {
        ops::subtract(self, other.into(), join, label, options)
    }

    fn text_values(&self, column: Column) -> Vec<String> {
        self.data
            .distinct_values(column)
            .into_iter()
            .map(|v| v.to_string())
            .collect()
    }

    pub fn models(&self) -> Vec<String> {
        self.text_values(Column::Model)
    }

    pub fn scenarios(&self) -> Vec<String> {
        self.text_values(Column::Scenario)
    }

    pub fn regions(&self) -> Vec<String> {
        self.text_values(Column::Region)
    }

    pub fn variables(&self) -> Vec<String> {
        self.text_values(Column::Variable)
    }

    pub fn units(&self) -> Vec<String> {
        self.text_values(Column::Unit)
    }

    pub fn years(&self) -> Vec<i64> {
        self.data
            .distinct_values(Column::Year)
            .iter()
            .filter_map(KeyValue::as_year)
            .collect()
    }

    /// The (model, scenario) pairs in the frame.
    pub fn scenario_keys(&self) -> BTreeSet<ScenarioKey> {
        self.meta.keys()
    }
}
