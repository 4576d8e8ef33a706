//! Local upload normalization: RTE tab-separated exports.
//!
//! The files RTE serves as `eCO2mix_RTE_*.xls` are tab-separated text in an
//! 8-bit encoding. The first row is the header and the last row is always a
//! warning footer, never data.

use csv::StringRecord;

use super::encoding::SourceEncoding;
use super::timestamps::parse_date_time;
use crate::domain::{CanonicalFrame, CanonicalRecord, Cell};
use crate::error::PipelineError;
use crate::schema::{DATE_COLUMN, TIME_COLUMN};

/// Decode, parse, and canonicalize an uploaded export.
pub fn normalize_upload(
    raw: &[u8],
    encoding: SourceEncoding,
) -> Result<CanonicalFrame, PipelineError> {
    let text = encoding.decode(raw)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::malformed(format!("unreadable header: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let date_idx = column_index(&header, DATE_COLUMN)?;
    let time_idx = column_index(&header, TIME_COLUMN)?;

    let mut rows: Vec<StringRecord> = Vec::new();
    for row in reader.records() {
        rows.push(row.map_err(|e| PipelineError::malformed(format!("unreadable row: {e}")))?);
    }
    if rows.pop().is_some() {
        log::debug!("dropped trailing footer row");
    }

    // Empty header cells come from the trailing tab RTE writes on every line.
    let columns: Vec<(usize, &String)> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    let mut blank = 0usize;
    for row in &rows {
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        if row.len() != header.len() {
            return Err(PipelineError::malformed(format!(
                "line {line}: expected {} tab-separated fields, found {}",
                header.len(),
                row.len()
            )));
        }

        let date = row.get(date_idx).unwrap_or_default();
        let time = row.get(time_idx).unwrap_or_default();
        if date.trim().is_empty() && time.trim().is_empty() {
            blank += 1;
            continue;
        }
        let datetime = parse_date_time(date, time).ok_or_else(|| {
            PipelineError::malformed(format!(
                "line {line}: cannot parse date/time '{date} {time}'"
            ))
        })?;

        let mut record = CanonicalRecord::new(datetime);
        for (idx, name) in &columns {
            let cell = Cell::parse(row.get(*idx).unwrap_or_default());
            record.values.insert((*name).clone(), cell);
        }
        records.push(record);
    }
    if blank > 0 {
        log::warn!("skipped {blank} row(s) with an empty date and time");
    }

    let names = columns.into_iter().map(|(_, name)| name.clone()).collect();
    let frame = CanonicalFrame::new(names, records);
    log::info!(
        "normalized upload: {} row(s), {} column(s)",
        frame.len(),
        frame.columns().len()
    );
    Ok(frame)
}

fn column_index(header: &[String], name: &str) -> Result<usize, PipelineError> {
    header.iter().position(|h| h == name).ok_or_else(|| {
        PipelineError::malformed(format!("missing required column '{name}' in header"))
    })
}
