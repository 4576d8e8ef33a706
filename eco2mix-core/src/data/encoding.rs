//! Byte decoding for the local upload.
//!
//! RTE exports are written in an 8-bit Western European code page, not UTF-8,
//! so the declared encoding is mandatory input to the upload normalizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Declared text encoding of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceEncoding {
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    #[default]
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
    /// Windows code page 1252: latin-1 with printable characters in 0x80..=0x9F.
    #[serde(rename = "windows-1252", alias = "cp1252")]
    Windows1252,
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
}

/// Code points for bytes 0x80..=0x9F in windows-1252. Unassigned slots
/// decode like latin-1.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

impl SourceEncoding {
    pub fn decode(self, bytes: &[u8]) -> Result<String, PipelineError> {
        match self {
            SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            SourceEncoding::Windows1252 => Ok(bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
                    _ => char::from(b),
                })
                .collect()),
            SourceEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                PipelineError::malformed(format!(
                    "input is not valid UTF-8 (byte offset {}); declare latin-1 for RTE exports",
                    e.utf8_error().valid_up_to()
                ))
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceEncoding::Latin1 => "latin-1",
            SourceEncoding::Windows1252 => "windows-1252",
            SourceEncoding::Utf8 => "utf-8",
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(SourceEncoding::Latin1),
            "windows-1252" | "cp1252" => Ok(SourceEncoding::Windows1252),
            "utf-8" | "utf8" => Ok(SourceEncoding::Utf8),
            other => Err(format!(
                "unknown encoding '{other}' (expected latin-1, windows-1252 or utf-8)"
            )),
        }
    }
}
