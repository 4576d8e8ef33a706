//! Error statistics over an aligned comparison series.

use serde::{Deserialize, Serialize};

use eco2mix_core::AlignedComparison;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStats {
    pub count: usize,
    /// Mean absolute error.
    pub mae: Option<f64>,
    /// Root mean squared error.
    pub rmse: Option<f64>,
    /// Mean of prediction − actual.
    pub bias: Option<f64>,
}

impl ComparisonStats {
    pub fn from_comparison(rows: &[AlignedComparison]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        let (abs, sq, signed) = rows.iter().map(AlignedComparison::error).fold(
            (0.0, 0.0, 0.0),
            |(abs, sq, signed), e| (abs + e.abs(), sq + e * e, signed + e),
        );
        Self {
            count: rows.len(),
            mae: Some(abs / n),
            rmse: Some((sq / n).sqrt()),
            bias: Some(signed / n),
        }
    }
}
