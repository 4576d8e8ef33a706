//! Display-side helpers over a canonical frame: date windows, variable
//! selection, and conversion to a Polars `DataFrame`.

use chrono::{Duration, Months, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalFrame, Cell};
use crate::schema::{DATETIME_COLUMN, DISPLAY_VARIABLES};

/// Preset windows ending at the newest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    LastWeek,
    LastMonth,
}

impl CanonicalFrame {
    /// Records with `start <= datetime <= end`.
    pub fn between(&self, start: NaiveDateTime, end: NaiveDateTime) -> CanonicalFrame {
        self.retain_records(|r| r.datetime >= start && r.datetime <= end)
    }

    /// Inclusive bounds of `window`, or `None` for an empty frame.
    pub fn window_bounds(&self, window: Window) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let end = self.last_datetime()?;
        let start = match window {
            Window::LastWeek => end - Duration::weeks(1),
            Window::LastMonth => end.checked_sub_months(Months::new(1))?,
        };
        Some((start, end))
    }

    pub fn window(&self, window: Window) -> CanonicalFrame {
        match self.window_bounds(window) {
            Some((start, end)) => self.between(start, end),
            None => self.clone(),
        }
    }

    /// Keep only the listed columns, in the listed order. Names the frame
    /// does not have are skipped.
    pub fn select(&self, columns: &[&str]) -> CanonicalFrame {
        let mut keep = Vec::with_capacity(columns.len());
        for &name in columns {
            if self.has_column(name) {
                keep.push(name.to_string());
            } else {
                log::warn!("column '{name}' not present; skipped");
            }
        }
        self.with_columns(keep)
    }

    /// Keep the standard charting variables the frame carries, in
    /// [`DISPLAY_VARIABLES`] order.
    pub fn display_variables(&self) -> CanonicalFrame {
        let keep = DISPLAY_VARIABLES
            .iter()
            .filter(|name| self.has_column(name))
            .map(|name| name.to_string())
            .collect();
        self.with_columns(keep)
    }

    /// Drop records where any of `columns` is not a number.
    pub fn drop_missing(&self, columns: &[&str]) -> CanonicalFrame {
        self.retain_records(|r| columns.iter().all(|c| r.number(c).is_some()))
    }

    /// Convert to a Polars frame: a millisecond `Datetime` column followed by
    /// one column per value column. A column holding any text becomes a
    /// string column; otherwise it is `f64` with nulls for missing cells.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let millis: Vec<i64> = self
            .records()
            .iter()
            .map(|r| r.datetime.and_utc().timestamp_millis())
            .collect();

        let mut columns = Vec::with_capacity(self.columns().len() + 1);
        columns.push(
            Column::new(DATETIME_COLUMN.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        );

        for name in self.columns() {
            let cells: Vec<Option<&Cell>> = self.records().iter().map(|r| r.get(name)).collect();
            let textual = cells.iter().any(|c| matches!(c, Some(Cell::Text(_))));
            let column = if textual {
                let values: Vec<Option<String>> = cells
                    .iter()
                    .copied()
                    .map(|c| match c {
                        None | Some(Cell::Missing) => None,
                        Some(cell) => Some(cell.to_string()),
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<f64>> = cells
                    .iter()
                    .copied()
                    .map(|c| c.and_then(Cell::as_number))
                    .collect();
                Column::new(name.as_str().into(), values)
            };
            columns.push(column);
        }

        DataFrame::new(columns)
    }
}
