//! Prediction, ground-truth, and aligned comparison series.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One model prediction, stamped with the canonical (naive local) timestamp
/// of the record it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub datetime: NaiveDateTime,
    pub predicted: f64,
}

/// One realized price from the ground-truth series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActualPricePoint {
    pub datetime: DateTime<Utc>,
    pub price: f64,
}

/// A forecast matched with the realized price at the same UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedComparison {
    /// Join key.
    pub datetime: DateTime<Utc>,
    /// Canonical timestamp of the originating record.
    pub local: NaiveDateTime,
    pub predicted: f64,
    pub actual: f64,
}

impl AlignedComparison {
    /// Signed error, prediction minus realized price.
    pub fn error(&self) -> f64 {
        self.predicted - self.actual
    }
}
