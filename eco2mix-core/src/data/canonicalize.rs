//! Ordering and de-duplication shared by every ingestion path.

use std::collections::HashSet;

use crate::domain::CanonicalRecord;

/// Sort records by ascending timestamp and drop repeated timestamps.
///
/// The sort is stable, so among records sharing a timestamp the one that
/// appeared first in the source is kept.
pub fn canonicalize(mut records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    records.sort_by_key(|r| r.datetime);
    let before = records.len();
    let mut seen = HashSet::with_capacity(records.len());
    records.retain(|r| seen.insert(r.datetime));
    let dropped = before - records.len();
    if dropped > 0 {
        log::warn!("dropped {dropped} record(s) with a duplicate timestamp");
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, minute, 0)
            .unwrap()
    }

    fn record(minute: u32, conso: f64) -> CanonicalRecord {
        let mut r = CanonicalRecord::new(at(minute));
        r.values.insert("Consommation".into(), Cell::Number(conso));
        r
    }

    #[test]
    fn sorts_ascending() {
        let out = canonicalize(vec![record(30, 3.0), record(0, 1.0), record(15, 2.0)]);
        let minutes: Vec<_> = out.iter().map(|r| r.datetime).collect();
        assert_eq!(minutes, vec![at(0), at(15), at(30)]);
    }

    #[test]
    fn keeps_first_duplicate() {
        let out = canonicalize(vec![record(15, 1.0), record(0, 0.0), record(15, 2.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].number("Consommation"), Some(1.0));
    }

    #[test]
    fn empty_input() {
        assert!(canonicalize(Vec::new()).is_empty());
    }
}
