//! Pre-fit model artifacts: a predictor and its companion feature scaler.
//!
//! The forecast engine only sees the `Predictor` and `Scaler` traits. The
//! JSON specs below are the on-disk encodings this crate knows how to load;
//! other model families plug in as further trait implementations.

pub mod artifact;
pub mod predictor;
pub mod scaler;

pub use artifact::{
    is_valid_artifact_name, ArtifactStore, DirectoryStore, ModelArtifact, DEFAULT_SCALER_FILE,
};
pub use predictor::{LinearModel, Predictor, PredictorSpec};
pub use scaler::{MinMaxScaler, Scaler, ScalerSpec, StandardScaler};

use thiserror::Error;

/// Failure inside a scaler or predictor invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{stage}: expected {expected} features, got {actual}")]
    DimensionMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{stage}: non-finite value produced for row {row}")]
    NonFinite { stage: &'static str, row: usize },
}

/// Check that every row has `expected` columns.
pub(crate) fn check_width(
    stage: &'static str,
    rows: &[Vec<f64>],
    expected: usize,
) -> Result<(), ModelError> {
    match rows.iter().find(|r| r.len() != expected) {
        Some(bad) => Err(ModelError::DimensionMismatch {
            stage,
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}
