//! Remote source: the ODRE éCO2mix JSON export.
//!
//! `RemoteSource` abstracts the network so the normalizer can be exercised
//! with in-memory payloads. The HTTP implementation performs exactly one
//! request with a bounded timeout; retry policy is left to callers.

use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::time::Duration;

use reqwest::StatusCode;

use super::timestamps::parse_local;
use crate::domain::{CanonicalFrame, CanonicalRecord, Cell};
use crate::error::PipelineError;
use crate::schema::{to_canonical, DATETIME_COLUMN};

/// One record of the remote payload: a flat field → value object.
pub type RemoteRecord = serde_json::Map<String, serde_json::Value>;

/// National real-time dataset export endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://odre.opendatasoft.com/api/explore/v2.1/catalog/datasets/eco2mix-national-tr/exports/json";

/// Civil time the export is asked to report in.
pub const EXPORT_TIMEZONE: &str = "Europe/Paris";

/// Anything that can produce remote records for an inclusive datetime range.
pub trait RemoteSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn fetch(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RemoteRecord>, PipelineError>;
}

/// Map field names and derive `Datetime` for every remote record.
///
/// Records without a parseable combined datetime are excluded. Fields absent
/// from some records are filled with [`Cell::Missing`] so every record
/// carries every column.
pub fn normalize_remote(records: &[RemoteRecord]) -> CanonicalFrame {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for raw in records {
        let mut datetime = None;
        let mut values = Vec::with_capacity(raw.len());
        for (field, value) in raw {
            let name = to_canonical(field);
            if name == DATETIME_COLUMN {
                datetime = value.as_str().and_then(parse_local);
                continue;
            }
            if seen.insert(name.to_string()) {
                columns.push(name.to_string());
            }
            values.push((name.to_string(), Cell::from_json(value)));
        }

        let Some(datetime) = datetime else {
            skipped += 1;
            continue;
        };
        let mut record = CanonicalRecord::new(datetime);
        record.values.extend(values);
        out.push(record);
    }

    for record in &mut out {
        for column in &columns {
            record
                .values
                .entry(column.clone())
                .or_insert(Cell::Missing);
        }
    }
    if skipped > 0 {
        log::warn!("excluded {skipped} remote record(s) without a parseable datetime");
    }

    let frame = CanonicalFrame::new(columns, out);
    log::info!(
        "normalized remote payload: {} row(s), {} column(s)",
        frame.len(),
        frame.columns().len()
    );
    frame
}

/// Fetch a range from `source` and normalize it.
pub fn fetch_and_normalize(
    source: &dyn RemoteSource,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<CanonicalFrame, PipelineError> {
    if end < start {
        return Err(PipelineError::RemoteFetch(format!(
            "empty range: end {end} is before start {start}"
        )));
    }
    log::info!("fetching {} from {start} to {end}", source.name());
    let records = source.fetch(start, end)?;
    Ok(normalize_remote(&records))
}

/// Blocking HTTP client for the ODRE explore API export.
pub struct OdreClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    timeout: Duration,
}

impl OdreClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::RemoteFetch(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Server-side filter selecting an inclusive `date_heure` range.
    pub fn range_filter(start: NaiveDateTime, end: NaiveDateTime) -> String {
        format!(
            "date_heure >= '{}' AND date_heure <= '{}'",
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Query parameters for one export request.
    ///
    /// The export reports datetimes and reads the `where` bounds in UTC unless
    /// a timezone is named, so the request pins it to the civil time the
    /// bounds are expressed in.
    pub fn query(start: NaiveDateTime, end: NaiveDateTime) -> Vec<(&'static str, String)> {
        vec![
            ("limit", "-1".to_string()),
            ("timezone", EXPORT_TIMEZONE.to_string()),
            ("where", Self::range_filter(start, end)),
        ]
    }

    fn send_error(&self, timed_out: bool, detail: impl std::fmt::Display) -> PipelineError {
        if timed_out {
            PipelineError::RemoteFetch(format!("no response within {}s", self.timeout.as_secs()))
        } else {
            PipelineError::RemoteFetch(detail.to_string())
        }
    }

    /// Turn a response status and body into records.
    pub fn read_response(
        &self,
        status: StatusCode,
        body: &[u8],
    ) -> Result<Vec<RemoteRecord>, PipelineError> {
        if !status.is_success() {
            return Err(PipelineError::RemoteFetch(format!(
                "HTTP {status} from {}",
                self.endpoint
            )));
        }
        serde_json::from_slice(body)
            .map_err(|e| PipelineError::RemoteFetch(format!("unexpected payload: {e}")))
    }
}

impl RemoteSource for OdreClient {
    fn name(&self) -> &str {
        "odre_eco2mix"
    }

    fn fetch(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RemoteRecord>, PipelineError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&Self::query(start, end))
            .send()
            .map_err(|e| self.send_error(e.is_timeout(), &e))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .map_err(|e| self.send_error(e.is_timeout(), &e))?;
        let records = self.read_response(status, &body)?;
        log::info!("received {} remote record(s)", records.len());
        Ok(records)
    }
}
