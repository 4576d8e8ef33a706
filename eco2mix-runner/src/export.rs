//! Export of run results: prediction CSV, comparison CSV, JSON manifest, and
//! the canonical frame as CSV.
//!
//! Persisted manifests carry a `schema_version`. Newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use eco2mix_core::model::is_valid_artifact_name;
use eco2mix_core::{AlignedComparison, CanonicalFrame, ForecastPoint};

use crate::pipeline::{ForecastRun, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(run: &ForecastRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize ForecastRun to JSON")
}

pub fn import_json(json: &str) -> Result<ForecastRun> {
    let run: ForecastRun =
        serde_json::from_str(json).context("failed to deserialize ForecastRun from JSON")?;
    if run.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            run.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(run)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: Datetime, Prediction.
pub fn export_previsions_csv(points: &[ForecastPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Datetime", "Prediction"])?;
    for p in points {
        wtr.write_record([
            p.datetime.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.6}", p.predicted),
        ])?;
    }
    finish(wtr)
}

/// Columns: Datetime (UTC), Datetime (local), Prediction, Actual, Error.
pub fn export_comparison_csv(rows: &[AlignedComparison]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Datetime (UTC)",
        "Datetime (local)",
        "Prediction",
        "Actual",
        "Error",
    ])?;
    for r in rows {
        wtr.write_record([
            r.datetime.format(TIMESTAMP_FORMAT).to_string(),
            r.local.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.6}", r.predicted),
            format!("{:.6}", r.actual),
            format!("{:.6}", r.error()),
        ])?;
    }
    finish(wtr)
}

/// `Datetime` followed by every frame column. Missing cells are written as
/// `ND`, matching the source exports.
pub fn export_canonical_csv(frame: &CanonicalFrame) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["Datetime".to_string()];
    header.extend(frame.columns().iter().cloned());
    wtr.write_record(&header)?;
    for record in frame.records() {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.datetime.format(TIMESTAMP_FORMAT).to_string());
        for column in frame.columns() {
            row.push(record.get(column).map(|c| c.to_string()).unwrap_or_default());
        }
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Run bundle ─────────────────────────────────────────────────────

/// Write the outputs of one run under `output_dir`:
/// - `{previsions_file}` — latest predictions, overwritten on every run
/// - `{artifact}/run.json` — the full `ForecastRun`
/// - `{artifact}/comparison.csv` — aligned comparison series
///
/// Returns the per-artifact directory.
pub fn save_run(run: &ForecastRun, output_dir: &Path, previsions_file: &str) -> Result<PathBuf> {
    if !is_valid_artifact_name(&run.artifact) {
        bail!("refusing to save run: invalid artifact name '{}'", run.artifact);
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let previsions_path = output_dir.join(previsions_file);
    std::fs::write(&previsions_path, export_previsions_csv(&run.forecasts)?)
        .with_context(|| format!("failed to write {}", previsions_path.display()))?;

    let run_dir = output_dir.join(&run.artifact);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create run dir: {}", run_dir.display()))?;
    std::fs::write(run_dir.join("run.json"), export_json(run)?)?;
    std::fs::write(
        run_dir.join("comparison.csv"),
        export_comparison_csv(&run.comparison)?,
    )?;

    log::info!("saved {} run to {}", run.artifact, run_dir.display());
    Ok(run_dir)
}

/// Load a `ForecastRun` from a run directory's `run.json`.
pub fn load_run(dir: &Path) -> Result<ForecastRun> {
    let path = dir.join("run.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn previsions_header_and_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap();
        let csv = export_previsions_csv(&[ForecastPoint {
            datetime: dt,
            predicted: 71.25,
        }])
        .unwrap();
        assert_eq!(csv, "Datetime,Prediction\n2024-02-01 13:30:00,71.250000\n");
    }

    fn manifest(schema_version: u32, artifact: &str) -> String {
        format!(
            r#"{{"schema_version": {schema_version}, "artifact": "{artifact}", "artifact_fingerprint": null,
            "features": [], "dataset_hash": "", "clock": "utc", "canonical_rows": 0,
            "forecast_rows": 0, "aligned_rows": 0, "forecasts": [], "comparison": [],
            "stats": {{"count": 0, "mae": null, "rmse": null, "bias": null}}}}"#
        )
    }

    #[test]
    fn rejects_future_schema() {
        let err = import_json(&manifest(99, "x")).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version 99"));
    }

    #[test]
    fn save_run_refuses_names_outside_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("out");
        let run = import_json(&manifest(SCHEMA_VERSION, "../escape")).unwrap();
        let err = save_run(&run, &output, "previsions.csv").unwrap_err();
        assert!(err.to_string().contains("invalid artifact name"));
        assert!(!root.path().join("escape").exists());
        assert!(!output.exists());
    }
}
