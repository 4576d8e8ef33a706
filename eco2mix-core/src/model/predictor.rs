//! Predictors.

use serde::{Deserialize, Serialize};

use super::{check_width, ModelError};

/// A fitted regressor mapping one scaled feature row to one price.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// Ordered feature columns the predictor was fit on.
    fn feature_names(&self) -> &[String];

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

/// On-disk predictor encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PredictorSpec {
    #[serde(
        rename = "linear",
        alias = "linear_regression",
        alias = "ridge",
        alias = "lasso"
    )]
    Linear(LinearModel),
}

impl PredictorSpec {
    pub fn into_predictor(self) -> Box<dyn Predictor> {
        match self {
            PredictorSpec::Linear(m) => Box::new(m),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            PredictorSpec::Linear(m) => {
                if m.feature_names_in.is_empty() {
                    return Err("no feature names".into());
                }
                if m.coef.len() != m.feature_names_in.len() {
                    return Err(format!(
                        "{} coefficients for {} features",
                        m.coef.len(),
                        m.feature_names_in.len()
                    ));
                }
                Ok(())
            }
        }
    }
}

/// `intercept + Σ coef[i] · x[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names_in: Vec<String>,
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl Predictor for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names_in
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        check_width("predictor", rows, self.coef.len())?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let y = self.intercept + row.iter().zip(&self.coef).map(|(x, c)| x * c).sum::<f64>();
                if y.is_finite() {
                    Ok(y)
                } else {
                    Err(ModelError::NonFinite {
                        stage: "predictor",
                        row: i,
                    })
                }
            })
            .collect()
    }
}
