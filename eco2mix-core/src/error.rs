//! Structured error types for the ingestion and forecasting pipeline.
//!
//! Every variant is displayable as a single human-readable line so the runner
//! and the CLI can surface it without further formatting.

use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed source: {0}")]
    MalformedSource(String),

    #[error("artifact '{name}' not found: {detail}")]
    ArtifactNotFound { name: String, detail: String },

    #[error("artifact '{name}' is invalid: {reason}")]
    InvalidArtifact { name: String, reason: String },

    #[error("artifact '{artifact}' requires column(s) missing from the data: {}", missing.join(", "))]
    FeatureMismatch {
        artifact: String,
        missing: Vec<String>,
    },

    #[error("model execution failed for '{artifact}': {source}")]
    ModelExecution {
        artifact: String,
        #[source]
        source: ModelError,
    },

    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),
}

impl PipelineError {
    /// Short stable identifier, used by structured failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MalformedSource(_) => "malformed_source",
            PipelineError::ArtifactNotFound { .. } => "artifact_not_found",
            PipelineError::InvalidArtifact { .. } => "invalid_artifact",
            PipelineError::FeatureMismatch { .. } => "feature_mismatch",
            PipelineError::ModelExecution { .. } => "model_execution",
            PipelineError::RemoteFetch(_) => "remote_fetch",
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        PipelineError::MalformedSource(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_mismatch_lists_missing_columns() {
        let err = PipelineError::FeatureMismatch {
            artifact: "ridge".into(),
            missing: vec!["Gaz".into(), "Fioul".into()],
        };
        assert_eq!(
            err.to_string(),
            "artifact 'ridge' requires column(s) missing from the data: Gaz, Fioul"
        );
        assert_eq!(err.kind(), "feature_mismatch");
    }

    #[test]
    fn model_execution_carries_cause() {
        let err = PipelineError::ModelExecution {
            artifact: "linear".into(),
            source: ModelError::DimensionMismatch {
                stage: "scaler",
                expected: 3,
                actual: 2,
            },
        };
        assert!(err.to_string().contains("expected 3 features, got 2"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
