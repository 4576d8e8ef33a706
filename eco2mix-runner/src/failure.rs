//! Structured failure reports at the pipeline boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use eco2mix_core::PipelineError;

use crate::config::ConfigError;

/// Pipeline stage a failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Config,
    Source,
    Actuals,
    Artifact,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Source => "source",
            Stage::Actuals => "actuals",
            Stage::Artifact => "artifact",
            Stage::Forecast => "forecast",
        };
        f.write_str(name)
    }
}

/// A failed invocation: where, what kind, and a readable cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub stage: Stage,
    pub kind: String,
    pub message: String,
}

impl Failure {
    pub fn new(stage: Stage, error: &PipelineError) -> Self {
        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Self {
            stage,
            kind: error.kind().to_string(),
            message,
        }
    }

    pub fn config(error: &ConfigError) -> Self {
        Self {
            stage: Stage::Config,
            kind: "invalid_config".into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.stage, self.kind, self.message)
    }
}

impl std::error::Error for Failure {}
