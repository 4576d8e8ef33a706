//! Artifact store: named predictors paired with one shared scaler.
//!
//! Layout of a [`DirectoryStore`]:
//!
//! ```text
//! {dir}/scaler.json       shared companion scaler
//! {dir}/{name}.json       one predictor per artifact name
//! ```

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::predictor::{Predictor, PredictorSpec};
use super::scaler::{Scaler, ScalerSpec};
use super::ModelError;
use crate::error::PipelineError;

/// File name of the shared scaler inside a model directory.
pub const DEFAULT_SCALER_FILE: &str = "scaler.json";

const ARTIFACT_EXTENSION: &str = "json";

/// A loaded predictor together with its companion scaler.
pub struct ModelArtifact {
    name: String,
    predictor: Box<dyn Predictor>,
    scaler: Box<dyn Scaler>,
    fingerprint: Option<String>,
}

impl ModelArtifact {
    pub fn new(
        name: impl Into<String>,
        predictor: Box<dyn Predictor>,
        scaler: Box<dyn Scaler>,
    ) -> Self {
        Self {
            name: name.into(),
            predictor,
            scaler,
            fingerprint: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered feature columns the predictor needs.
    pub fn required_features(&self) -> &[String] {
        self.predictor.feature_names()
    }

    /// blake3 hash of the files the artifact was loaded from, if any.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn predictor_kind(&self) -> &str {
        self.predictor.name()
    }

    pub fn scaler_kind(&self) -> &str {
        self.scaler.name()
    }

    /// Scale then predict.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let scaled = self.scaler.transform(rows)?;
        self.predictor.predict(&scaled)
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("name", &self.name)
            .field("predictor", &self.predictor.name())
            .field("scaler", &self.scaler.name())
            .field("features", &self.required_features())
            .finish()
    }
}

/// Source of model artifacts, addressed by name.
pub trait ArtifactStore: Send + Sync {
    fn load(&self, name: &str) -> Result<ModelArtifact, PipelineError>;

    /// Artifact names available in the store, sorted.
    fn list(&self) -> Result<Vec<String>, PipelineError>;
}

/// Artifacts stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
    scaler_file: String,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            scaler_file: DEFAULT_SCALER_FILE.to_string(),
        }
    }

    pub fn with_scaler_file(mut self, file: impl Into<String>) -> Self {
        self.scaler_file = file.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    fn predictor_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }

    fn is_scaler_name(&self, name: &str) -> bool {
        Path::new(&self.scaler_file)
            .file_stem()
            .is_some_and(|stem| stem == name)
    }
}

/// Whether `name` can be joined onto a directory without leaving it: non-empty,
/// no path separators, not `.` and no `..`.
pub fn is_valid_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

impl ArtifactStore for DirectoryStore {
    fn load(&self, name: &str) -> Result<ModelArtifact, PipelineError> {
        let name = name.strip_suffix(".json").unwrap_or(name);
        let not_found = |detail: String| PipelineError::ArtifactNotFound {
            name: name.to_string(),
            detail,
        };
        let invalid = |reason: String| PipelineError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        if !is_valid_artifact_name(name) {
            return Err(invalid(format!(
                "'{name}' is not a valid artifact name (path separators and '..' are not allowed)"
            )));
        }
        if self.is_scaler_name(name) {
            return Err(not_found(format!(
                "'{name}' is not a predictor in {}",
                self.dir.display()
            )));
        }

        let predictor_path = self.predictor_path(name);
        if !predictor_path.is_file() {
            return Err(not_found(format!("no file {}", predictor_path.display())));
        }
        let scaler_path = self.scaler_path();
        if !scaler_path.is_file() {
            return Err(not_found(format!(
                "companion scaler {} is missing",
                scaler_path.display()
            )));
        }

        let predictor_bytes = fs::read(&predictor_path)
            .map_err(|e| not_found(format!("{}: {e}", predictor_path.display())))?;
        let scaler_bytes = fs::read(&scaler_path)
            .map_err(|e| not_found(format!("{}: {e}", scaler_path.display())))?;

        let predictor: PredictorSpec = serde_json::from_slice(&predictor_bytes)
            .map_err(|e| invalid(format!("{}: {e}", predictor_path.display())))?;
        predictor
            .validate()
            .map_err(|e| invalid(format!("{}: {e}", predictor_path.display())))?;
        let scaler: ScalerSpec = serde_json::from_slice(&scaler_bytes)
            .map_err(|e| invalid(format!("{}: {e}", scaler_path.display())))?;
        scaler
            .validate()
            .map_err(|e| invalid(format!("{}: {e}", scaler_path.display())))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&predictor_bytes);
        hasher.update(&scaler_bytes);

        let mut artifact = ModelArtifact::new(name, predictor.into_predictor(), scaler.into_scaler());
        artifact.fingerprint = Some(hasher.finalize().to_hex().to_string());
        debug!(
            "loaded artifact {name}: {} predictor, {} scaler, {} features",
            artifact.predictor_kind(),
            artifact.scaler_kind(),
            artifact.required_features().len()
        );
        Ok(artifact)
    }

    fn list(&self) -> Result<Vec<String>, PipelineError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| PipelineError::ArtifactNotFound {
            name: self.dir.display().to_string(),
            detail: format!("cannot read model directory: {e}"),
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION))
            .filter(|path| path.file_name().is_some_and(|f| f != self.scaler_file.as_str()))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }
}
