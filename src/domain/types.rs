//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while building the index
//! - exported to JSON/CSV
//! - reloaded later for plotting or served from the cache

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Default lower/upper percentile cut applied to daily slopes.
pub const DEFAULT_OUTLIERS_PERCENTILE: f64 = 8.0;

/// One recorded purchase: an item bought on a date at a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub item_id: String,
    pub date: NaiveDate,
    pub price: f64,
}

impl Observation {
    pub fn new(item_id: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            item_id: item_id.into(),
            date,
            price,
        }
    }
}

/// Price ratio between two consecutive distinct dates of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeRecord {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub ratio: f64,
}

impl ChangeRecord {
    /// Interval length in days (always >= 1 for extracted records).
    pub fn days(&self) -> i64 {
        (self.date_to - self.date_from).num_days()
    }

    /// Per-day growth rate implied by the ratio: `ratio^(1/days)`.
    pub fn daily_slope(&self) -> f64 {
        self.ratio.powf(1.0 / self.days() as f64)
    }
}

/// Which averaging operator a mean-price baseline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MeanKind {
    Geometric,
    Arithmetic,
}

/// Engine configuration: integration horizon and outlier cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Percentile (0–50) trimmed from each tail of the daily-slope distribution.
    pub outliers_percentile: f64,
}

impl IndexConfig {
    pub fn new(min_date: NaiveDate, max_date: NaiveDate) -> Self {
        Self {
            min_date,
            max_date,
            outliers_percentile: DEFAULT_OUTLIERS_PERCENTILE,
        }
    }

    pub fn with_outliers_percentile(mut self, percentile: f64) -> Self {
        self.outliers_percentile = percentile;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_date > self.max_date {
            return Err(IndexError::InvalidConfig(format!(
                "min_date {} is after max_date {}.",
                self.min_date, self.max_date
            )));
        }
        let p = self.outliers_percentile;
        if !(p.is_finite() && (0.0..=50.0).contains(&p)) {
            return Err(IndexError::InvalidConfig(format!(
                "outliers_percentile must be within [0, 50], got {p}."
            )));
        }
        Ok(())
    }

    /// Number of calendar days in the horizon, both ends included.
    pub fn horizon_days(&self) -> usize {
        ((self.max_date - self.min_date).num_days() + 1).max(0) as usize
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.min_date && date <= self.max_date
    }
}

/// Sparse map of calendar day to daily growth coefficient.
///
/// Only days with at least one contributing change record have an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyRateTable {
    rates: BTreeMap<NaiveDate, f64>,
}

impl DailyRateTable {
    pub fn from_map(rates: BTreeMap<NaiveDate, f64>) -> Self {
        Self { rates }
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.rates.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.rates.iter().map(|(&d, &r)| (d, r))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next_back().copied()
    }
}

/// One day of the index curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub coefficient: f64,
}

/// Dense daily index curve.
///
/// Points cover every calendar day from `start()` to `end()` without gaps, so
/// the coefficient of a date is found by its day offset from the start.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexCurve {
    points: Vec<CurvePoint>,
}

impl IndexCurve {
    /// Build a curve from points, checking they are dense and ascending.
    pub fn from_points(points: Vec<CurvePoint>) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(IndexError::DataError("Index curve is empty.".to_string()));
        };
        let start = first.date;
        for (offset, p) in points.iter().enumerate() {
            let expected = start.checked_add_days(Days::new(offset as u64));
            if expected != Some(p.date) {
                return Err(IndexError::DataError(format!(
                    "Index curve has a gap or is unordered at {}.",
                    p.date
                )));
            }
            if !(p.coefficient.is_finite() && p.coefficient > 0.0) {
                return Err(IndexError::DataError(format!(
                    "Index curve has an invalid coefficient at {}.",
                    p.date
                )));
            }
        }
        Ok(Self { points })
    }

    /// Wrap points that are dense by construction (the integrator's output).
    pub(crate) fn from_dense(points: Vec<CurvePoint>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Exact-date coefficient lookup.
    pub fn coefficient(&self, date: NaiveDate) -> Result<f64> {
        let offset = (date - self.start()).num_days();
        if offset < 0 || offset as usize >= self.points.len() {
            return Err(IndexError::DateOutOfRange {
                date,
                min: self.start(),
                max: self.end(),
            });
        }
        Ok(self.points[offset as usize].coefficient)
    }
}

/// Diagnostics collected while building an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub n_observations: usize,
    pub n_items: usize,
    /// Items with at least two distinct dates.
    pub n_items_with_changes: usize,
    pub changes_extracted: usize,
    pub changes_retained: usize,
    /// Daily-slope bounds used by the outlier filter (exclusive).
    pub slope_bounds: Option<(f64, f64)>,
    /// Days of the horizon with a direct rate.
    pub rate_days: usize,
    pub fallback_rate: f64,
}

/// A fully built price index.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceIndex {
    pub config: IndexConfig,
    pub daily_rates: DailyRateTable,
    pub curve: IndexCurve,
    pub stats: IndexStats,
}

/// Summary stats about an observation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_observations: usize,
    pub n_items: usize,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub price_min: f64,
    pub price_max: f64,
}

/// A saved index file (JSON).
///
/// This is the portable form of a built index, read by `pidx plot` and by
/// the file cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    pub tool: String,
    pub built_on: NaiveDate,
    pub config: IndexConfig,
    pub stats: IndexStats,
    pub daily_rates: DailyRateTable,
    pub curve: Vec<CurvePoint>,
}

impl IndexFile {
    pub fn from_index(index: &PriceIndex, built_on: NaiveDate) -> Self {
        Self {
            tool: "pidx".to_string(),
            built_on,
            config: index.config,
            stats: index.stats.clone(),
            daily_rates: index.daily_rates.clone(),
            curve: index.curve.points().to_vec(),
        }
    }

    /// Rebuild the in-memory index, re-checking curve density.
    pub fn into_index(self) -> Result<PriceIndex> {
        Ok(PriceIndex {
            config: self.config,
            daily_rates: self.daily_rates,
            curve: IndexCurve::from_points(self.curve)?,
            stats: self.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_slope_normalizes_interval_length() {
        let rec = ChangeRecord {
            date_from: d(2021, 1, 1),
            date_to: d(2021, 1, 11),
            ratio: 1.1_f64.powi(10),
        };
        assert_eq!(rec.days(), 10);
        assert!((rec.daily_slope() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn config_validation() {
        let cfg = IndexConfig::new(d(2021, 1, 1), d(2021, 12, 31));
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.horizon_days(), 365);

        let reversed = IndexConfig::new(d(2022, 1, 1), d(2021, 1, 1));
        assert!(matches!(reversed.validate(), Err(IndexError::InvalidConfig(_))));

        let bad_pct = cfg.with_outliers_percentile(51.0);
        assert!(matches!(bad_pct.validate(), Err(IndexError::InvalidConfig(_))));
    }

    #[test]
    fn curve_rejects_gaps() {
        let points = vec![
            CurvePoint { date: d(2021, 1, 1), coefficient: 1.0 },
            CurvePoint { date: d(2021, 1, 3), coefficient: 1.0 },
        ];
        assert!(IndexCurve::from_points(points).is_err());
    }

    #[test]
    fn curve_lookup_is_exact_and_bounded() {
        let points = vec![
            CurvePoint { date: d(2021, 1, 1), coefficient: 1.0 },
            CurvePoint { date: d(2021, 1, 2), coefficient: 1.5 },
        ];
        let curve = IndexCurve::from_points(points).unwrap();
        assert_eq!(curve.coefficient(d(2021, 1, 2)).unwrap(), 1.5);
        assert!(matches!(
            curve.coefficient(d(2021, 1, 3)),
            Err(IndexError::DateOutOfRange { .. })
        ));
        assert!(matches!(
            curve.coefficient(d(2020, 12, 31)),
            Err(IndexError::DateOutOfRange { .. })
        ));
    }
}
