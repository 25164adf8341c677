//! Reporting utilities: index headline numbers and formatted terminal output.

pub mod format;

pub use format::*;

use chrono::NaiveDate;

use crate::domain::PriceIndex;

/// Headline numbers derived from a built index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    /// Rate used for days without evidence.
    pub fallback_rate: f64,
    /// `fallback_rate` compounded over a year, minus one.
    pub annualized_fallback: f64,
    /// Coefficient once the last day with evidence has been compounded in,
    /// i.e. on the day after it (the last day itself at the end of the horizon).
    pub last_observed: Option<(NaiveDate, f64)>,
    /// Coefficient at the reference date, when it lies inside the horizon.
    pub at_reference: Option<(NaiveDate, f64)>,
    pub at_end: (NaiveDate, f64),
}

/// Summarize `index` as seen from `reference` (typically today).
pub fn summarize_index(index: &PriceIndex, reference: NaiveDate) -> IndexSummary {
    let curve = &index.curve;
    let fallback_rate = index.stats.fallback_rate;
    let last_observed = index
        .daily_rates
        .last_date()
        .map(|d| d.succ_opt().filter(|next| *next <= index.config.max_date).unwrap_or(d))
        .and_then(|d| curve.coefficient(d).ok().map(|c| (d, c)));
    let at_reference = curve.coefficient(reference).ok().map(|c| (reference, c));
    let at_end = curve
        .points()
        .last()
        .map(|p| (p.date, p.coefficient))
        .unwrap_or((index.config.max_date, 1.0));

    IndexSummary {
        fallback_rate,
        annualized_fallback: fallback_rate.powi(365) - 1.0,
        last_observed,
        at_reference,
        at_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndexConfig, Observation};
    use crate::index::build_price_index;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn summary_reports_flat_index() {
        let config = IndexConfig::new(d(2021, 1, 1), d(2021, 12, 31));
        let obs = vec![Observation::new("a", d(2021, 3, 1), 5.0)];
        let index = build_price_index(&obs, &config).unwrap();

        let s = summarize_index(&index, d(2021, 6, 1));
        assert_eq!(s.fallback_rate, 1.0);
        assert_eq!(s.annualized_fallback, 0.0);
        assert_eq!(s.last_observed, None);
        assert_eq!(s.at_reference, Some((d(2021, 6, 1), 1.0)));
        assert_eq!(s.at_end, (d(2021, 12, 31), 1.0));

        assert_eq!(summarize_index(&index, d(2030, 1, 1)).at_reference, None);
    }

    #[test]
    fn summary_tracks_growth() {
        let config = IndexConfig::new(d(2021, 1, 1), d(2021, 12, 31)).with_outliers_percentile(0.0);
        let obs = vec![
            Observation::new("a", d(2021, 1, 1), 100.0),
            Observation::new("a", d(2021, 1, 3), 121.0),
            // Extreme slopes on the percentile bounds, filtered out.
            Observation::new("z", d(2021, 1, 1), 1.0),
            Observation::new("z", d(2021, 1, 2), 0.5),
            Observation::new("y", d(2021, 1, 1), 1.0),
            Observation::new("y", d(2021, 1, 2), 2.0),
        ];
        let index = build_price_index(&obs, &config).unwrap();
        let s = summarize_index(&index, d(2021, 1, 3));

        assert!((s.fallback_rate - 1.1).abs() < 1e-12);
        assert!(s.annualized_fallback > 0.0);
        let (date, coef) = s.last_observed.unwrap();
        // Rates on 01-01 and 01-02 are both in by 01-03.
        assert_eq!(date, d(2021, 1, 3));
        assert!((coef - 1.21).abs() < 1e-12);
        assert!((s.at_reference.unwrap().1 - 1.21).abs() < 1e-12);
    }

    #[test]
    fn last_observed_reaches_horizon_end() {
        let config = IndexConfig::new(d(2021, 1, 1), d(2021, 1, 3)).with_outliers_percentile(0.0);
        let obs = vec![
            Observation::new("a", d(2021, 1, 1), 100.0),
            Observation::new("a", d(2021, 1, 3), 121.0),
            Observation::new("z", d(2021, 1, 1), 1.0),
            Observation::new("z", d(2021, 1, 3), 0.25),
            Observation::new("y", d(2021, 1, 1), 1.0),
            Observation::new("y", d(2021, 1, 3), 4.0),
        ];
        let index = build_price_index(&obs, &config).unwrap();
        let (date, coef) = summarize_index(&index, d(2021, 1, 3)).last_observed.unwrap();
        assert_eq!(date, d(2021, 1, 3));
        assert!((coef - 1.21).abs() < 1e-12);
    }
}
