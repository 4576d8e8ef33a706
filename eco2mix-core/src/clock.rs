//! Conversion of naive canonical timestamps to UTC instants.
//!
//! Canonical records carry French civil time without an offset. The join
//! against the realized-price series happens in UTC, so the interpretation
//! of the wall clock is an explicit choice made by the caller.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockPolicy {
    /// Naive timestamps are already UTC.
    Utc,
    /// Naive timestamps are Europe/Paris civil time (CET/CEST).
    #[default]
    EuropeParis,
}

impl ClockPolicy {
    /// UTC instant for a wall-clock time.
    ///
    /// Under `EuropeParis`, times inside the spring-forward gap do not exist
    /// and yield `None`; times in the autumn fold resolve to the earlier
    /// (summer-time) instant.
    pub fn to_utc(self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            ClockPolicy::Utc => Some(local.and_utc()),
            ClockPolicy::EuropeParis => paris_to_utc(local),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ClockPolicy::Utc => "utc",
            ClockPolicy::EuropeParis => "europe_paris",
        }
    }
}

impl fmt::Display for ClockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "utc" => Ok(ClockPolicy::Utc),
            "europe_paris" | "europe/paris" | "paris" => Ok(ClockPolicy::EuropeParis),
            other => Err(format!("unknown clock policy '{other}' (expected utc or europe_paris)")),
        }
    }
}

fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = last.weekday().num_days_from_sunday();
    Some(last - Duration::days(i64::from(back)))
}

/// EU summer time: last Sunday of March 01:00 UTC to last Sunday of October
/// 01:00 UTC.
///
/// This is the harmonised EU rule in force since 1996. Earlier years used
/// other transition dates and are not modelled.
fn is_summer_time(instant: NaiveDateTime) -> bool {
    let year = instant.year();
    let bounds = last_sunday(year, 3)
        .zip(last_sunday(year, 10))
        .and_then(|(start, end)| Some((start.and_hms_opt(1, 0, 0)?, end.and_hms_opt(1, 0, 0)?)));
    match bounds {
        Some((start, end)) => instant >= start && instant < end,
        None => false,
    }
}

/// Europe/Paris wall clock for a UTC instant.
///
/// Both instants of the autumn fold map to the same wall-clock reading.
pub fn utc_to_paris(instant: DateTime<Utc>) -> NaiveDateTime {
    let utc = instant.naive_utc();
    if is_summer_time(utc) {
        utc + Duration::hours(2)
    } else {
        utc + Duration::hours(1)
    }
}

fn paris_to_utc(local: NaiveDateTime) -> Option<DateTime<Utc>> {
    let summer = local - Duration::hours(2);
    if is_summer_time(summer) {
        return Some(summer.and_utc());
    }
    let winter = local - Duration::hours(1);
    if !is_summer_time(winter) {
        return Some(winter.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn last_sundays_2024() {
        assert_eq!(last_sunday(2024, 3), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(last_sunday(2024, 10), NaiveDate::from_ymd_opt(2024, 10, 27));
        assert_eq!(last_sunday(2023, 12).unwrap().weekday(), Weekday::Sun);
    }

    #[test]
    fn winter_is_one_hour_ahead() {
        let utc = ClockPolicy::EuropeParis.to_utc(naive(2024, 1, 15, 12, 0)).unwrap();
        assert_eq!(utc.naive_utc(), naive(2024, 1, 15, 11, 0));
    }

    #[test]
    fn summer_is_two_hours_ahead() {
        let utc = ClockPolicy::EuropeParis.to_utc(naive(2024, 7, 1, 12, 0)).unwrap();
        assert_eq!(utc.naive_utc(), naive(2024, 7, 1, 10, 0));
    }

    #[test]
    fn spring_gap_does_not_exist() {
        assert_eq!(ClockPolicy::EuropeParis.to_utc(naive(2024, 3, 31, 2, 30)), None);
        let before = ClockPolicy::EuropeParis.to_utc(naive(2024, 3, 31, 1, 45)).unwrap();
        assert_eq!(before.naive_utc(), naive(2024, 3, 31, 0, 45));
        let after = ClockPolicy::EuropeParis.to_utc(naive(2024, 3, 31, 3, 0)).unwrap();
        assert_eq!(after.naive_utc(), naive(2024, 3, 31, 1, 0));
    }

    #[test]
    fn autumn_fold_takes_earlier_instant() {
        let utc = ClockPolicy::EuropeParis.to_utc(naive(2024, 10, 27, 2, 30)).unwrap();
        assert_eq!(utc.naive_utc(), naive(2024, 10, 27, 0, 30));
        let after = ClockPolicy::EuropeParis.to_utc(naive(2024, 10, 27, 3, 0)).unwrap();
        assert_eq!(after.naive_utc(), naive(2024, 10, 27, 2, 0));
    }

    #[test]
    fn utc_instants_map_to_paris_wall_clock() {
        let winter = naive(2023, 12, 31, 23, 15).and_utc();
        assert_eq!(utc_to_paris(winter), naive(2024, 1, 1, 0, 15));
        let summer = naive(2024, 7, 1, 10, 0).and_utc();
        assert_eq!(utc_to_paris(summer), naive(2024, 7, 1, 12, 0));
        // first instant after the spring switch
        let spring = naive(2024, 3, 31, 1, 0).and_utc();
        assert_eq!(utc_to_paris(spring), naive(2024, 3, 31, 3, 0));
        let fold_first = naive(2024, 10, 27, 0, 30).and_utc();
        let fold_second = naive(2024, 10, 27, 1, 30).and_utc();
        assert_eq!(utc_to_paris(fold_first), naive(2024, 10, 27, 2, 30));
        assert_eq!(utc_to_paris(fold_second), naive(2024, 10, 27, 2, 30));
    }

    #[test]
    fn paris_round_trips_outside_the_fold() {
        let local = naive(2024, 3, 15, 8, 45);
        let utc = ClockPolicy::EuropeParis.to_utc(local).unwrap();
        assert_eq!(utc_to_paris(utc), local);
    }

    #[test]
    fn utc_policy_is_identity() {
        let t = naive(2024, 3, 31, 2, 30);
        assert_eq!(ClockPolicy::Utc.to_utc(t).unwrap().naive_utc(), t);
    }

    #[test]
    fn parses_names() {
        assert_eq!("utc".parse::<ClockPolicy>(), Ok(ClockPolicy::Utc));
        assert_eq!("Europe/Paris".parse::<ClockPolicy>(), Ok(ClockPolicy::EuropeParis));
        assert!("cet".parse::<ClockPolicy>().is_err());
    }
}
