//! Feature scalers.

use serde::{Deserialize, Serialize};

use super::{check_width, ModelError};

/// Column-wise feature transform applied before prediction.
pub trait Scaler: Send + Sync {
    fn name(&self) -> &str;

    /// Number of columns the scaler was fit on.
    fn n_features(&self) -> usize;

    fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// On-disk scaler encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl ScalerSpec {
    pub fn into_scaler(self) -> Box<dyn Scaler> {
        match self {
            ScalerSpec::Standard(s) => Box::new(s),
            ScalerSpec::MinMax(s) => Box::new(s),
        }
    }

    /// Structural problems that make the scaler unusable.
    pub fn validate(&self) -> Result<(), String> {
        let (a, b, what) = match self {
            ScalerSpec::Standard(s) => (s.mean.len(), s.scale.len(), "mean/scale"),
            ScalerSpec::MinMax(s) => (s.min.len(), s.scale.len(), "min/scale"),
        };
        if a != b {
            return Err(format!("{what} lengths differ ({a} vs {b})"));
        }
        Ok(())
    }
}

/// `(x - mean) / scale`, column-wise. A zero scale leaves the centered value
/// unchanged, as for constant training columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler for StandardScaler {
    fn name(&self) -> &str {
        "standard"
    }

    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_width("scaler", rows, self.n_features())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
                    .collect()
            })
            .collect())
    }
}

/// `x * scale + min`, column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler for MinMaxScaler {
    fn name(&self) -> &str {
        "min_max"
    }

    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        check_width("scaler", rows, self.n_features())?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.min.iter().zip(&self.scale))
                    .map(|(x, (m, s))| x * s + m)
                    .collect()
            })
            .collect())
    }
}
