//! Cell — a single measured value of a canonical record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal token the RTE exports write for "not available".
pub const NOT_AVAILABLE: &str = "ND";

/// One value of a canonical record.
///
/// The `ND` sentinel and empty cells become [`Cell::Missing`] at ingestion
/// time; they are never coerced to zero. Non-numeric cells (perimeter, nature,
/// the raw date and time strings) are kept verbatim as [`Cell::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Parse a raw delimited-text cell.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
            return Cell::Missing;
        }
        let parsed = trimmed
            .parse::<f64>()
            .or_else(|_| trimmed.replace(',', ".").parse::<f64>());
        match parsed {
            Ok(v) if v.is_finite() => Cell::Number(v),
            Ok(_) => Cell::Missing,
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    /// Convert a remote JSON value. `null` is missing; strings go through
    /// [`Cell::parse`] so a remote `"ND"` is treated like the local one.
    pub fn from_json(value: &serde_json::Value) -> Cell {
        match value {
            serde_json::Value::Null => Cell::Missing,
            serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
            serde_json::Value::String(s) => Cell::parse(s),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Numeric value, if this cell holds one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => write!(f, "{NOT_AVAILABLE}"),
        }
    }
}
