//! Daily rate aggregation.
//!
//! A change spanning `[date_from, date_to)` contributes its daily slope to each
//! covered day. Contributions landing on the same day are combined with the
//! geometric mean, accumulated in log space.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::DailyRateTable;
use crate::index::outliers::SlopedChange;

/// Build the sparse per-day rate table.
pub fn aggregate_daily_rates(changes: &[SlopedChange]) -> DailyRateTable {
    // (sum of ln(rate), contribution count) per day.
    let mut acc: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for change in changes {
        let ln_slope = change.slope.ln();
        let days = change.record.days().max(0) as usize;
        for day in change.record.date_from.iter_days().take(days) {
            let entry = acc.entry(day).or_insert((0.0, 0));
            entry.0 += ln_slope;
            entry.1 += 1;
        }
    }

    let rates = acc
        .into_iter()
        .map(|(day, (sum_ln, n))| (day, (sum_ln / n as f64).exp()))
        .collect();

    DailyRateTable::from_map(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeRecord;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sloped(from: NaiveDate, to: NaiveDate, ratio: f64) -> SlopedChange {
        let record = ChangeRecord {
            date_from: from,
            date_to: to,
            ratio,
        };
        SlopedChange {
            record,
            slope: record.daily_slope(),
        }
    }

    #[test]
    fn interval_spreads_same_rate_over_half_open_range() {
        let c = sloped(d(2021, 1, 1), d(2021, 6, 1), 1.21);
        let table = aggregate_daily_rates(&[c]);

        assert_eq!(table.len(), 151);
        assert_eq!(table.first_date(), Some(d(2021, 1, 1)));
        assert_eq!(table.last_date(), Some(d(2021, 5, 31)));
        assert!(table.get(d(2021, 6, 1)).is_none());

        let expected = 1.21_f64.powf(1.0 / 151.0);
        for (_, rate) in table.iter() {
            assert!((rate - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn overlapping_days_use_geometric_mean() {
        let a = sloped(d(2021, 1, 1), d(2021, 1, 2), 1.25);
        let b = sloped(d(2021, 1, 1), d(2021, 1, 2), 0.8);
        let table = aggregate_daily_rates(&[a, b]);
        assert_eq!(table.len(), 1);
        assert!((table.get(d(2021, 1, 1)).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn days_without_evidence_are_absent() {
        let a = sloped(d(2021, 1, 1), d(2021, 1, 3), 1.1);
        let b = sloped(d(2021, 1, 10), d(2021, 1, 11), 0.9);
        let table = aggregate_daily_rates(&[a, b]);
        assert_eq!(table.len(), 3);
        assert!(table.get(d(2021, 1, 5)).is_none());
        assert!(table.iter().all(|(_, r)| r > 0.0));
    }
}
