//! éCO2mix runner: configuration, pipeline orchestration, comparison
//! statistics and export.
//!
//! This crate builds on `eco2mix-core` to provide:
//! - `eco2mix.toml` configuration with defaults for every field
//! - Source loading (upload file or remote range) into a canonical frame
//! - Single and parallel multi-artifact forecast runs
//! - Structured failures carrying stage, kind and cause
//! - CSV and JSON export of run results

pub mod config;
pub mod export;
pub mod failure;
pub mod pipeline;
pub mod stats;

pub use config::{ConfigError, PipelineConfig, DEFAULT_CONFIG_FILE};
pub use failure::{Failure, Stage};
pub use pipeline::{ForecastRun, Pipeline, SourceSpec, SCHEMA_VERSION};
pub use stats::ComparisonStats;
