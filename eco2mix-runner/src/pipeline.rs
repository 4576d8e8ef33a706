//! End-to-end orchestration: source → canonical frame → forecast → reconcile.
//!
//! A `Pipeline` owns the configuration, the artifact store and the remote
//! source. Each artifact run loads its own artifact, so several runs can
//! proceed in parallel over the same immutable frame and price series.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use eco2mix_core::data::{fetch_and_normalize, normalize_upload, read_actuals, OdreClient, RemoteSource};
use eco2mix_core::fingerprint::dataset_hash;
use eco2mix_core::model::{ArtifactStore, DirectoryStore};
use eco2mix_core::{
    forecast, reconcile, ActualPricePoint, AlignedComparison, CanonicalFrame, ClockPolicy,
    ForecastPoint, PipelineError,
};

use crate::config::PipelineConfig;
use crate::failure::{Failure, Stage};
use crate::stats::ComparisonStats;

/// Current schema version for persisted run manifests.
pub const SCHEMA_VERSION: u32 = 1;

/// Where the canonical data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Tab-separated export on disk.
    Upload { path: PathBuf },
    /// Remote export over an inclusive datetime range.
    Remote {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Result of one artifact applied to one canonical frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRun {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub artifact: String,
    pub artifact_fingerprint: Option<String>,
    pub features: Vec<String>,
    pub dataset_hash: String,
    pub clock: ClockPolicy,
    pub canonical_rows: usize,
    pub forecast_rows: usize,
    pub aligned_rows: usize,
    pub forecasts: Vec<ForecastPoint>,
    pub comparison: Vec<AlignedComparison>,
    pub stats: ComparisonStats,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

pub struct Pipeline {
    config: PipelineConfig,
    store: Box<dyn ArtifactStore>,
    remote: Box<dyn RemoteSource>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        store: Box<dyn ArtifactStore>,
        remote: Box<dyn RemoteSource>,
    ) -> Self {
        Self {
            config,
            store,
            remote,
        }
    }

    /// Directory artifact store and ODRE client as configured.
    pub fn from_config(config: PipelineConfig) -> Result<Self, Failure> {
        config.validate().map_err(|e| Failure::config(&e))?;
        let store = DirectoryStore::new(&config.models.directory)
            .with_scaler_file(config.models.scaler_file.clone());
        let remote = OdreClient::new(config.remote.endpoint(), config.remote.timeout())
            .map_err(|e| Failure::new(Stage::Source, &e))?;
        Ok(Self::new(config, Box::new(store), Box::new(remote)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub fn load_source(&self, spec: &SourceSpec) -> Result<CanonicalFrame, Failure> {
        let result = match spec {
            SourceSpec::Upload { path } => std::fs::read(path)
                .map_err(|e| {
                    PipelineError::MalformedSource(format!("cannot read {}: {e}", path.display()))
                })
                .and_then(|raw| normalize_upload(&raw, self.config.source.encoding)),
            SourceSpec::Remote { start, end } => {
                fetch_and_normalize(self.remote.as_ref(), *start, *end)
            }
        };
        result.map_err(|e| Failure::new(Stage::Source, &e))
    }

    pub fn load_actuals(&self) -> Result<Vec<ActualPricePoint>, Failure> {
        read_actuals(&self.config.actuals.path, &self.config.actuals.layout)
            .map_err(|e| Failure::new(Stage::Actuals, &e))
    }

    /// Load `artifact`, forecast over `frame`, and join with `actuals`.
    pub fn run(
        &self,
        frame: &CanonicalFrame,
        actuals: &[ActualPricePoint],
        artifact: &str,
    ) -> Result<ForecastRun, Failure> {
        let loaded = self
            .store
            .load(artifact)
            .map_err(|e| Failure::new(Stage::Artifact, &e))?;
        let forecasts = forecast(frame, &loaded).map_err(|e| Failure::new(Stage::Forecast, &e))?;

        let clock = self.config.reconcile.clock;
        let comparison = reconcile(&forecasts, actuals, clock);
        let stats = ComparisonStats::from_comparison(&comparison);
        log::info!(
            "{}: {} forecast(s), {} aligned, MAE {}",
            loaded.name(),
            forecasts.len(),
            comparison.len(),
            stats.mae.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
        );

        Ok(ForecastRun {
            schema_version: SCHEMA_VERSION,
            artifact: loaded.name().to_string(),
            artifact_fingerprint: loaded.fingerprint().map(str::to_string),
            features: loaded.required_features().to_vec(),
            dataset_hash: dataset_hash(frame),
            clock,
            canonical_rows: frame.len(),
            forecast_rows: forecasts.len(),
            aligned_rows: comparison.len(),
            forecasts,
            comparison,
            stats,
        })
    }

    /// Run every artifact in parallel. Results come back in the order of
    /// `artifacts`; one failure does not affect the others.
    pub fn run_many(
        &self,
        frame: &CanonicalFrame,
        actuals: &[ActualPricePoint],
        artifacts: &[String],
    ) -> Vec<(String, Result<ForecastRun, Failure>)> {
        artifacts
            .par_iter()
            .map(|name| (name.clone(), self.run(frame, actuals, name)))
            .collect()
    }

    /// Artifacts to evaluate: the explicit list, else the configured
    /// defaults, else everything in the store.
    pub fn resolve_artifacts(&self, requested: &[String]) -> Result<Vec<String>, Failure> {
        if !requested.is_empty() {
            return Ok(requested.to_vec());
        }
        if !self.config.models.default.is_empty() {
            return Ok(self.config.models.default.clone());
        }
        self.store
            .list()
            .map_err(|e| Failure::new(Stage::Artifact, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco2mix_core::data::RemoteRecord;
    use eco2mix_core::model::{LinearModel, StandardScaler};
    use eco2mix_core::ModelArtifact;

    struct OneModel;

    impl ArtifactStore for OneModel {
        fn load(&self, name: &str) -> Result<ModelArtifact, PipelineError> {
            if name != "conso" {
                return Err(PipelineError::ArtifactNotFound {
                    name: name.into(),
                    detail: "only 'conso' exists".into(),
                });
            }
            Ok(ModelArtifact::new(
                "conso",
                Box::new(LinearModel {
                    feature_names_in: vec!["Consommation".into()],
                    coef: vec![0.001],
                    intercept: 0.0,
                }),
                Box::new(StandardScaler {
                    mean: vec![0.0],
                    scale: vec![1.0],
                }),
            ))
        }

        fn list(&self) -> Result<Vec<String>, PipelineError> {
            Ok(vec!["conso".into()])
        }
    }

    struct Canned(Vec<RemoteRecord>);

    impl RemoteSource for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn fetch(
            &self,
            _start: NaiveDateTime,
            _end: NaiveDateTime,
        ) -> Result<Vec<RemoteRecord>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    fn pipeline(clock: ClockPolicy) -> Pipeline {
        let records: Vec<RemoteRecord> = serde_json::from_str(
            r#"[
                {"date_heure":"2024-01-01T01:00:00+01:00","consommation":60000},
                {"date_heure":"2024-01-01T02:00:00+01:00","consommation":null},
                {"date_heure":"2024-01-01T03:00:00+01:00","consommation":62000}
            ]"#,
        )
        .unwrap();
        let mut config = PipelineConfig::default();
        config.reconcile.clock = clock;
        Pipeline::new(config, Box::new(OneModel), Box::new(Canned(records)))
    }

    fn range() -> SourceSpec {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        SourceSpec::Remote {
            start: day.and_hms_opt(0, 0, 0).unwrap(),
            end: day.and_hms_opt(23, 45, 0).unwrap(),
        }
    }

    fn actual(h: u32, price: f64) -> ActualPricePoint {
        ActualPricePoint {
            datetime: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
                .and_utc(),
            price,
        }
    }

    #[test]
    fn runs_end_to_end_with_paris_clock() {
        let p = pipeline(ClockPolicy::EuropeParis);
        let frame = p.load_source(&range()).unwrap();
        assert_eq!(frame.len(), 3);

        let run = p.run(&frame, &[actual(0, 58.0), actual(2, 65.0)], "conso").unwrap();
        assert_eq!(run.schema_version, SCHEMA_VERSION);
        assert_eq!(run.canonical_rows, 3);
        assert_eq!(run.forecast_rows, 2);
        assert_eq!(run.aligned_rows, 2);
        assert_eq!(run.stats.count, 2);
        assert_eq!(run.comparison[0].actual, 58.0);
        assert!((run.comparison[0].predicted - 60.0).abs() < 1e-9);
        assert_eq!(run.dataset_hash.len(), 64);
    }

    #[test]
    fn utc_clock_matches_different_instants() {
        let p = pipeline(ClockPolicy::Utc);
        let frame = p.load_source(&range()).unwrap();
        let run = p.run(&frame, &[actual(0, 58.0), actual(3, 61.0)], "conso").unwrap();
        assert_eq!(run.aligned_rows, 1);
        assert_eq!(run.comparison[0].actual, 61.0);
    }

    #[test]
    fn unknown_artifact_fails_at_artifact_stage() {
        let p = pipeline(ClockPolicy::Utc);
        let frame = p.load_source(&range()).unwrap();
        let failure = p.run(&frame, &[], "absent").unwrap_err();
        assert_eq!(failure.stage, Stage::Artifact);
        assert_eq!(failure.kind, "artifact_not_found");
    }

    #[test]
    fn run_many_isolates_failures() {
        let p = pipeline(ClockPolicy::Utc);
        let frame = p.load_source(&range()).unwrap();
        let names = vec!["conso".to_string(), "absent".to_string()];
        let results = p.run_many(&frame, &[], &names);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "conso");
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[test]
    fn inverted_range_is_a_source_failure() {
        let p = pipeline(ClockPolicy::Utc);
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let spec = SourceSpec::Remote {
            start: day.and_hms_opt(0, 0, 0).unwrap(),
            end: day.and_hms_opt(0, 0, 0).unwrap() - chrono::Duration::days(1),
        };
        let failure = p.load_source(&spec).unwrap_err();
        assert_eq!(failure.stage, Stage::Source);
        assert_eq!(failure.kind, "remote_fetch");
    }

    #[test]
    fn resolve_prefers_explicit_then_defaults_then_store() {
        let mut p = pipeline(ClockPolicy::Utc);
        assert_eq!(p.resolve_artifacts(&["x".into()]).unwrap(), vec!["x"]);
        assert_eq!(p.resolve_artifacts(&[]).unwrap(), vec!["conso"]);
        p.config.models.default = vec!["y".into()];
        assert_eq!(p.resolve_artifacts(&[]).unwrap(), vec!["y"]);
    }
}
