//! Dataset fingerprinting.
//!
//! A run manifest records which canonical data a forecast was computed from.
//! The hash covers the column list and every record in order, so two frames
//! hash equal exactly when they hold the same values.

use crate::domain::{CanonicalFrame, Cell};

/// Hex BLAKE3 digest of a canonical frame.
pub fn dataset_hash(frame: &CanonicalFrame) -> String {
    let mut hasher = blake3::Hasher::new();
    for column in frame.columns() {
        hasher.update(column.as_bytes());
        hasher.update(&[0x1f]);
    }
    hasher.update(&[0x1e]);

    for record in frame.records() {
        hasher.update(&record.datetime.and_utc().timestamp().to_le_bytes());
        for (column, cell) in &record.values {
            hasher.update(column.as_bytes());
            hasher.update(&[0x1f]);
            match cell {
                Cell::Number(v) => {
                    hasher.update(b"n");
                    hasher.update(&v.to_bits().to_le_bytes());
                }
                Cell::Text(s) => {
                    hasher.update(b"t");
                    hasher.update(s.as_bytes());
                }
                Cell::Missing => {
                    hasher.update(b"m");
                }
            }
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1e]);
    }
    hasher.finalize().to_hex().to_string()
}
