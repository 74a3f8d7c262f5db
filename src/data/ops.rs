//! Binary operations between two frames.
//!
//! Both operands are grouped by every key column except the join column. A
//! group may hold at most one record on each side; groups present on both
//! sides are combined and relabelled with the caller's label, groups present
//! on one side only are dropped.

use std::collections::{BTreeMap, BTreeSet};

use super::frame::Frame;
use super::meta::{MetaRow, MetaStore};
use super::model::{Column, KeyValue, TimeseriesKey, TimeseriesRecord};
use super::timeseries::TimeseriesStore;
use crate::error::{Error, OperandSide, Result, ScenarioKey};

/// The right-hand side of a binary operation.
///
/// Only `Frame` is supported; the other variants exist so that callers
/// holding plain numbers get a typed rejection instead of a silent coercion.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Frame(&'a Frame),
    Scalar(f64),
    Vector(&'a [f64]),
    Matrix(&'a [Vec<f64>]),
}

impl Operand<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Operand::Frame(_) => "a frame",
            Operand::Scalar(_) => "a scalar",
            Operand::Vector(_) => "a vector",
            Operand::Matrix(_) => "a matrix",
        }
    }
}

impl<'a> From<&'a Frame> for Operand<'a> {
    fn from(frame: &'a Frame) -> Self {
        Operand::Frame(frame)
    }
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

impl From<i64> for Operand<'_> {
    fn from(v: i64) -> Self {
        Operand::Scalar(v as f64)
    }
}

impl<'a> From<&'a [f64]> for Operand<'a> {
    fn from(v: &'a [f64]) -> Self {
        Operand::Vector(v)
    }
}

impl<'a> From<&'a Vec<f64>> for Operand<'a> {
    fn from(v: &'a Vec<f64>) -> Self {
        Operand::Vector(v)
    }
}

impl<'a> From<&'a [Vec<f64>]> for Operand<'a> {
    fn from(v: &'a [Vec<f64>]) -> Self {
        Operand::Matrix(v)
    }
}

impl<'a> From<&'a Vec<Vec<f64>>> for Operand<'a> {
    fn from(v: &'a Vec<Vec<f64>>) -> Self {
        Operand::Matrix(v)
    }
}

/// Options for [`Frame::subtract_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtractOptions {
    /// Resolve metadata conflicts in favour of the left operand instead of
    /// failing.
    pub ignore_meta_conflict: bool,
}

pub(crate) fn subtract(
    lhs: &Frame,
    rhs: Operand<'_>,
    join: Column,
    label: &str,
    options: SubtractOptions,
) -> Result<Frame> {
    let Operand::Frame(rhs) = rhs else {
        return Err(Error::UnsupportedOperand(rhs.kind()));
    };
    combine(lhs, rhs, join, label, options, |a, b| a - b)
}

/// Group records by every column but `join`, failing if a group repeats.
fn index_by_group<'s>(
    store: &'s TimeseriesStore,
    group_columns: &[Column],
    join: Column,
    side: OperandSide,
) -> Result<BTreeMap<Vec<KeyValue>, (&'s TimeseriesKey, f64)>> {
    let mut groups = BTreeMap::new();
    for (key, value) in store.iter() {
        // Store keys are unique, so a second record in a group always has a
        // different join value.
        if groups.insert(key.project(group_columns), (key, value)).is_some() {
            return Err(Error::AmbiguousGrouping {
                operand: side,
                column: join,
            });
        }
    }
    Ok(groups)
}

fn combine<F>(
    lhs: &Frame,
    rhs: &Frame,
    join: Column,
    label: &str,
    options: SubtractOptions,
    op: F,
) -> Result<Frame>
where
    F: Fn(f64, f64) -> f64,
{
    let group_columns: Vec<Column> = Column::ALL.into_iter().filter(|c| *c != join).collect();
    let left = index_by_group(lhs.data(), &group_columns, join, OperandSide::Left)?;
    let right = index_by_group(rhs.data(), &group_columns, join, OperandSide::Right)?;

    let mut records = Vec::with_capacity(left.len().min(right.len()));
    for (group, (key, left_value)) in &left {
        let Some((_, right_value)) = right.get(group) else {
            continue;
        };
        let mut key = (*key).clone();
        key.relabel(join, label)?;
        records.push(TimeseriesRecord::new(key, op(*left_value, *right_value)));
    }

    let unmatched = left.len() + right.len() - 2 * records.len();
    if unmatched > 0 {
        log::warn!("{unmatched} records without a counterpart were dropped while joining on `{join}`");
    }
    log::debug!(
        "joined {} x {} records on `{join}` into {} records labelled {label:?}",
        left.len(),
        right.len(),
        records.len()
    );

    let data = TimeseriesStore::from_records(records)?;
    let keys = data.scenario_keys();
    let meta = if join.identifies_meta() {
        // The label is a new scenario identity; nothing to carry over.
        MetaStore::seeded(keys)
    } else {
        merge_meta(lhs.meta(), rhs.meta(), &keys, options.ignore_meta_conflict)?
    };
    Ok(Frame::from_parts(data, meta))
}

/// Column-wise reconciliation of both operands' metadata for `keys`.
fn merge_meta(
    left: &MetaStore,
    right: &MetaStore,
    keys: &BTreeSet<ScenarioKey>,
    ignore_conflict: bool,
) -> Result<MetaStore> {
    let mut rows = Vec::with_capacity(keys.len());
    let mut conflicts = Vec::new();

    for key in keys {
        let mut row: MetaRow = right.get(key).cloned().unwrap_or_default();
        let mut conflicted = false;
        for (column, value) in left.get(key).into_iter().flatten() {
            if let Some(other) = row.get(column) {
                conflicted |= value.cmp(other).is_ne();
            }
            row.insert(column.clone(), value.clone());
        }
        if conflicted {
            conflicts.push(key.clone());
        }
        rows.push((key.clone(), row));
    }

    if !conflicts.is_empty() {
        if !ignore_conflict {
            return Err(Error::MetaConflict { keys: conflicts });
        }
        log::warn!(
            "keeping left-hand meta for {} conflicting scenarios",
            conflicts.len()
        );
    }
    Ok(MetaStore::from_rows(rows))
}
