//! Ground-truth spot prices.
//!
//! The realized-price file is an external, read-only delimited export with at
//! least a UTC datetime column and a numeric price column. Extra columns
//! (country, ISO code, local datetime) are ignored.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::timestamps::parse_utc;
use crate::domain::ActualPricePoint;
use crate::error::PipelineError;

/// Column layout of a ground-truth file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActualsLayout {
    pub datetime_column: String,
    pub price_column: String,
    pub delimiter: char,
}

impl Default for ActualsLayout {
    fn default() -> Self {
        Self {
            datetime_column: "Datetime (UTC)".into(),
            price_column: "Price (EUR/MWhe)".into(),
            delimiter: ',',
        }
    }
}

/// Read realized prices from a file on disk.
pub fn read_actuals(
    path: &Path,
    layout: &ActualsLayout,
) -> Result<Vec<ActualPricePoint>, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| {
        PipelineError::malformed(format!("cannot read ground truth {}: {e}", path.display()))
    })?;
    parse_actuals(&bytes, layout)
}

/// Parse realized prices, sorted by ascending timestamp.
///
/// Rows with an empty price are skipped; an unparseable timestamp or a
/// non-numeric price is a malformed source.
pub fn parse_actuals(
    bytes: &[u8],
    layout: &ActualsLayout,
) -> Result<Vec<ActualPricePoint>, PipelineError> {
    let delimiter = u8::try_from(layout.delimiter).map_err(|_| {
        PipelineError::malformed(format!("delimiter '{}' is not a single byte", layout.delimiter))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let header = reader
        .headers()
        .map_err(|e| PipelineError::malformed(format!("ground truth header: {e}")))?
        .clone();
    let find = |name: &str| {
        header.iter().position(|h| h.trim() == name).ok_or_else(|| {
            PipelineError::malformed(format!("ground truth has no '{name}' column"))
        })
    };
    let dt_idx = find(&layout.datetime_column)?;
    let price_idx = find(&layout.price_column)?;

    let mut points = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| PipelineError::malformed(format!("ground truth row: {e}")))?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let raw_price = row.get(price_idx).unwrap_or_default().trim();
        if raw_price.is_empty() {
            continue;
        }
        let raw_dt = row.get(dt_idx).unwrap_or_default();
        let datetime = parse_utc(raw_dt).ok_or_else(|| {
            PipelineError::malformed(format!("ground truth line {line}: bad datetime '{raw_dt}'"))
        })?;
        let price = raw_price.parse::<f64>().map_err(|_| {
            PipelineError::malformed(format!("ground truth line {line}: bad price '{raw_price}'"))
        })?;
        points.push(ActualPricePoint { datetime, price });
    }
    points.sort_by_key(|p| p.datetime);
    log::info!("loaded {} realized price(s)", points.len());
    Ok(points)
}
