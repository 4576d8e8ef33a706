//! Pipeline configuration, read from `eco2mix.toml`.
//!
//! Every section and field is optional; an empty file yields the defaults.
//!
//! ```toml
//! [source]
//! encoding = "latin-1"
//!
//! [remote]
//! base_url = "https://odre.opendatasoft.com/api/explore/v2.1"
//! dataset = "eco2mix-national-tr"
//! timeout_secs = 30
//!
//! [models]
//! directory = "models"
//! scaler_file = "scaler.json"
//! default = ["ridge"]
//!
//! [actuals]
//! path = "data/France.csv"
//! datetime_column = "Datetime (UTC)"
//! price_column = "Price (EUR/MWhe)"
//! delimiter = ","
//!
//! [reconcile]
//! clock = "europe_paris"
//!
//! [output]
//! directory = "data"
//! previsions_file = "previsions.csv"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use eco2mix_core::data::{ActualsLayout, SourceEncoding};
use eco2mix_core::model::DEFAULT_SCALER_FILE;
use eco2mix_core::ClockPolicy;

/// Conventional config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "eco2mix.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub remote: RemoteConfig,
    pub models: ModelsConfig,
    pub actuals: ActualsConfig,
    pub reconcile: ReconcileConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub encoding: SourceEncoding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub dataset: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://odre.opendatasoft.com/api/explore/v2.1".into(),
            dataset: "eco2mix-national-tr".into(),
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    /// JSON export URL of the configured dataset.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/catalog/datasets/{}/exports/json",
            self.base_url.trim_end_matches('/'),
            self.dataset
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub directory: PathBuf,
    pub scaler_file: String,
    /// Artifacts evaluated when none are named on the command line.
    pub default: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("models"),
            scaler_file: DEFAULT_SCALER_FILE.into(),
            default: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActualsConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub layout: ActualsLayout,
}

impl Default for ActualsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/France.csv"),
            layout: ActualsLayout::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub clock: ClockPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub previsions_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            previsions_file: "previsions.csv".into(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `path` if given, else `eco2mix.toml` when it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "remote.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.remote.dataset.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "remote.dataset",
                reason: "must not be empty".into(),
            });
        }
        if self.models.scaler_file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "models.scaler_file",
                reason: "must not be empty".into(),
            });
        }
        if !self.actuals.layout.delimiter.is_ascii() {
            return Err(ConfigError::Invalid {
                field: "actuals.delimiter",
                reason: format!("'{}' is not a single-byte character", self.actuals.layout.delimiter),
            });
        }
        if self.output.previsions_file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output.previsions_file",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
