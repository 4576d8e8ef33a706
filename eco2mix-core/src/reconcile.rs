//! Reconciliation: inner join of predictions and realized prices on the UTC
//! instant.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::clock::ClockPolicy;
use crate::domain::{ActualPricePoint, AlignedComparison, ForecastPoint};

/// Join `forecasts` with `actuals`.
///
/// Forecast timestamps are converted with `clock`; a forecast whose local time
/// does not exist under the policy is dropped. Only instants present on both
/// sides survive. The result is sorted by ascending instant regardless of the
/// input order; when either side repeats an instant, its first occurrence is
/// used. An empty intersection is an empty result.
pub fn reconcile(
    forecasts: &[ForecastPoint],
    actuals: &[ActualPricePoint],
    clock: ClockPolicy,
) -> Vec<AlignedComparison> {
    let mut prices: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for point in actuals {
        prices.entry(point.datetime).or_insert(point.price);
    }

    let mut joined: BTreeMap<DateTime<Utc>, AlignedComparison> = BTreeMap::new();
    let mut unconvertible = 0usize;
    for point in forecasts {
        let Some(instant) = clock.to_utc(point.datetime) else {
            unconvertible += 1;
            debug!("{} does not exist under {clock}, dropped", point.datetime);
            continue;
        };
        let Some(&actual) = prices.get(&instant) else {
            continue;
        };
        if let Entry::Vacant(slot) = joined.entry(instant) {
            slot.insert(AlignedComparison {
                datetime: instant,
                local: point.datetime,
                predicted: point.predicted,
                actual,
            });
        }
    }

    info!(
        "reconciled {} forecast(s) with {} actual(s): {} aligned, {} unconvertible",
        forecasts.len(),
        actuals.len(),
        joined.len(),
        unconvertible
    );
    joined.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn naive(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn fc(h: u32, p: f64) -> ForecastPoint {
        ForecastPoint {
            datetime: naive(h),
            predicted: p,
        }
    }

    fn act(h: u32, p: f64) -> ActualPricePoint {
        ActualPricePoint {
            datetime: naive(h).and_utc(),
            price: p,
        }
    }

    #[test]
    fn strict_inner_join() {
        let out = reconcile(
            &[fc(1, 10.0), fc(2, 20.0), fc(3, 30.0)],
            &[act(1, 11.0), act(3, 29.0)],
            ClockPolicy::Utc,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].local, naive(1));
        assert_eq!(out[0].actual, 11.0);
        assert_eq!(out[1].local, naive(3));
        assert_eq!(out[1].error(), 1.0);
    }

    #[test]
    fn no_actuals_yields_empty() {
        assert!(reconcile(&[fc(1, 1.0)], &[], ClockPolicy::Utc).is_empty());
    }

    #[test]
    fn output_sorted_whatever_the_input_order() {
        let out = reconcile(
            &[fc(3, 3.0), fc(1, 1.0), fc(2, 2.0)],
            &[act(2, 0.0), act(3, 0.0), act(1, 0.0)],
            ClockPolicy::Utc,
        );
        let hours: Vec<_> = out.iter().map(|c| c.local).collect();
        assert_eq!(hours, vec![naive(1), naive(2), naive(3)]);
    }

    #[test]
    fn paris_clock_shifts_the_join_key() {
        // 12:00 CET is 11:00 UTC.
        let out = reconcile(
            &[fc(12, 50.0)],
            &[act(11, 48.0), act(12, 99.0)],
            ClockPolicy::EuropeParis,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].actual, 48.0);
        assert_eq!(out[0].local, naive(12));
    }

    #[test]
    fn duplicate_actuals_keep_first() {
        let out = reconcile(&[fc(1, 1.0)], &[act(1, 5.0), act(1, 6.0)], ClockPolicy::Utc);
        assert_eq!(out[0].actual, 5.0);
    }
}
