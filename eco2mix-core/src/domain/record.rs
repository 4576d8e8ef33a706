//! Canonical records and the ordered frame that holds them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cell::Cell;
use crate::data::canonicalize::canonicalize;

/// One normalized row: a naive local timestamp plus open-ended named values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub datetime: NaiveDateTime,
    pub values: BTreeMap<String, Cell>,
}

impl CanonicalRecord {
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.values.get(column)
    }

    /// Numeric value of `column`; `None` when absent, missing, or text.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.values.get(column).and_then(Cell::as_number)
    }
}

/// Canonical record set.
///
/// Invariants, enforced by every constructor:
/// - records are sorted by ascending `datetime`
/// - no two records share a `datetime` (first occurrence wins)
/// - `columns` lists every value column in first-seen order; the distinguished
///   `Datetime` key is not part of it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFrame {
    columns: Vec<String>,
    records: Vec<CanonicalRecord>,
}

impl CanonicalFrame {
    /// Build a frame, sorting and de-duplicating `records`.
    pub fn new(columns: Vec<String>, records: Vec<CanonicalRecord>) -> Self {
        Self {
            columns,
            records: canonicalize(records),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn first_datetime(&self) -> Option<NaiveDateTime> {
        self.records.first().map(|r| r.datetime)
    }

    pub fn last_datetime(&self) -> Option<NaiveDateTime> {
        self.records.last().map(|r| r.datetime)
    }

    pub fn datetimes(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.records.iter().map(|r| r.datetime)
    }

    /// Keep only records matching `keep`. Order and uniqueness are preserved.
    pub(crate) fn retain_records(&self, keep: impl Fn(&CanonicalRecord) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Same records restricted to `columns` (in the given order).
    pub(crate) fn with_columns(&self, columns: Vec<String>) -> Self {
        let records = self
            .records
            .iter()
            .map(|r| CanonicalRecord {
                datetime: r.datetime,
                values: r
                    .values
                    .iter()
                    .filter(|(k, _)| columns.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect();
        Self { columns, records }
    }
}
