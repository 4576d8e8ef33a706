//! Forecast engine: canonical frame + model artifact → prediction series.

use log::{debug, info};

use crate::domain::{CanonicalFrame, ForecastPoint};
use crate::error::PipelineError;
use crate::model::{ModelArtifact, ModelError};

/// Apply `artifact` to every record of `frame` that has a numeric value for
/// each required feature.
///
/// Feature presence is checked against the frame's columns before any row is
/// looked at. Rows with a missing or non-numeric required value are dropped
/// and never reach the scaler or predictor.
pub fn forecast(
    frame: &CanonicalFrame,
    artifact: &ModelArtifact,
) -> Result<Vec<ForecastPoint>, PipelineError> {
    let features = artifact.required_features();

    let missing: Vec<String> = features
        .iter()
        .filter(|f| !frame.has_column(f))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::FeatureMismatch {
            artifact: artifact.name().to_string(),
            missing,
        });
    }

    let mut datetimes = Vec::with_capacity(frame.len());
    let mut rows = Vec::with_capacity(frame.len());
    for record in frame.records() {
        let row: Option<Vec<f64>> = features.iter().map(|f| record.number(f)).collect();
        match row {
            Some(row) => {
                datetimes.push(record.datetime);
                rows.push(row);
            }
            None => debug!("{}: skipping incomplete row at {}", artifact.name(), record.datetime),
        }
    }

    let dropped = frame.len() - rows.len();
    if rows.is_empty() {
        info!(
            "{}: no complete rows among {} record(s), nothing to forecast",
            artifact.name(),
            frame.len()
        );
        return Ok(Vec::new());
    }

    let execution_error = |source: ModelError| PipelineError::ModelExecution {
        artifact: artifact.name().to_string(),
        source,
    };
    let predictions = artifact.predict(&rows).map_err(execution_error)?;
    if predictions.len() != rows.len() {
        return Err(execution_error(ModelError::DimensionMismatch {
            stage: "output",
            expected: rows.len(),
            actual: predictions.len(),
        }));
    }

    info!(
        "{}: {} prediction(s), {} incomplete row(s) dropped",
        artifact.name(),
        predictions.len(),
        dropped
    );

    Ok(datetimes
        .into_iter()
        .zip(predictions)
        .map(|(datetime, predicted)| ForecastPoint { datetime, predicted })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalRecord, Cell};
    use crate::model::{LinearModel, Predictor, Scaler, StandardScaler};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn frame(rows: &[(u32, Cell, Cell)]) -> CanonicalFrame {
        let records = rows
            .iter()
            .map(|(h, conso, gaz)| {
                let mut r = CanonicalRecord::new(at(*h));
                r.values.insert("Consommation".into(), conso.clone());
                r.values.insert("Gaz".into(), gaz.clone());
                r
            })
            .collect();
        CanonicalFrame::new(vec!["Consommation".into(), "Gaz".into()], records)
    }

    fn linear(features: &[&str]) -> Box<LinearModel> {
        Box::new(LinearModel {
            feature_names_in: features.iter().map(|s| s.to_string()).collect(),
            coef: vec![1.0; features.len()],
            intercept: 0.0,
        })
    }

    fn identity(n: usize) -> Box<StandardScaler> {
        Box::new(StandardScaler {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        })
    }

    /// Predictor that records every row it sees.
    struct Spy {
        features: Vec<String>,
        calls: Arc<AtomicUsize>,
    }

    impl Predictor for Spy {
        fn name(&self) -> &str {
            "spy"
        }
        fn feature_names(&self) -> &[String] {
            &self.features
        }
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            self.calls.fetch_add(rows.len(), Ordering::SeqCst);
            assert!(rows.iter().flatten().all(|x| x.is_finite()));
            Ok(rows.iter().map(|r| r.iter().sum()).collect())
        }
    }

    #[test]
    fn pairs_predictions_with_timestamps() {
        let f = frame(&[
            (0, Cell::Number(1.0), Cell::Number(2.0)),
            (1, Cell::Number(3.0), Cell::Number(4.0)),
        ]);
        let artifact = ModelArtifact::new("sum", linear(&["Consommation", "Gaz"]), identity(2));
        let out = forecast(&f, &artifact).unwrap();
        assert_eq!(
            out,
            vec![
                ForecastPoint { datetime: at(0), predicted: 3.0 },
                ForecastPoint { datetime: at(1), predicted: 7.0 },
            ]
        );
    }

    #[test]
    fn incomplete_rows_never_reach_the_model() {
        let f = frame(&[
            (0, Cell::Number(1.0), Cell::Missing),
            (1, Cell::Number(3.0), Cell::Number(4.0)),
            (2, Cell::Text("n/a".into()), Cell::Number(4.0)),
        ]);
        let calls = Arc::new(AtomicUsize::new(0));
        let spy = Spy {
            features: vec!["Consommation".into(), "Gaz".into()],
            calls: Arc::clone(&calls),
        };
        let artifact = ModelArtifact::new("spy", Box::new(spy), identity(2));
        let out = forecast(&f, &artifact).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].datetime, at(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_feature_column_is_a_mismatch() {
        let f = frame(&[(0, Cell::Number(1.0), Cell::Number(2.0))]);
        let artifact = ModelArtifact::new("lin", linear(&["Consommation", "Fioul"]), identity(2));
        match forecast(&f, &artifact).unwrap_err() {
            PipelineError::FeatureMismatch { missing, .. } => assert_eq!(missing, vec!["Fioul"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mismatch_reported_on_empty_frame() {
        let f = CanonicalFrame::new(vec!["Consommation".into()], vec![]);
        let artifact = ModelArtifact::new("lin", linear(&["Consommation", "Gaz"]), identity(2));
        assert!(matches!(
            forecast(&f, &artifact),
            Err(PipelineError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn empty_retained_set_skips_the_model() {
        let f = frame(&[(0, Cell::Missing, Cell::Missing)]);
        let calls = Arc::new(AtomicUsize::new(0));
        let spy = Spy {
            features: vec!["Consommation".into()],
            calls: Arc::clone(&calls),
        };
        let artifact = ModelArtifact::new("spy", Box::new(spy), identity(1));
        assert!(forecast(&f, &artifact).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn scaler_width_mismatch_is_model_execution() {
        let f = frame(&[(0, Cell::Number(1.0), Cell::Number(2.0))]);
        let artifact = ModelArtifact::new("lin", linear(&["Consommation", "Gaz"]), identity(3));
        let err = forecast(&f, &artifact).unwrap_err();
        assert_eq!(err.kind(), "model_execution");
        assert!(err.to_string().contains("expected 3 features, got 2"));
    }

    #[test]
    fn scaler_is_applied_before_predictor() {
        let f = frame(&[(0, Cell::Number(10.0), Cell::Number(0.0))]);
        let scaler: Box<dyn Scaler> = Box::new(StandardScaler {
            mean: vec![4.0, 0.0],
            scale: vec![2.0, 1.0],
        });
        let artifact = ModelArtifact::new("lin", linear(&["Consommation", "Gaz"]), scaler);
        assert_eq!(forecast(&f, &artifact).unwrap()[0].predicted, 3.0);
    }
}
