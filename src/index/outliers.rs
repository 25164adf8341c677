//! Percentile-based outlier filter on daily slopes.
//!
//! Each change is normalized to a per-day rate (`ratio^(1/days)`) so that a
//! 3-day and a 300-day interval are comparable. Records whose rate falls
//! outside the open interval `(P_p, P_{100-p})` are dropped.

use crate::domain::ChangeRecord;
use crate::math::percentile_sorted;

/// A change record with its per-day rate already computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopedChange {
    pub record: ChangeRecord,
    pub slope: f64,
}

/// Filter output.
#[derive(Debug, Clone, Default)]
pub struct FilteredChanges {
    pub kept: Vec<SlopedChange>,
    /// Exclusive `(lower, upper)` slope bounds; `None` when there was no input.
    pub bounds: Option<(f64, f64)>,
}

/// Keep records whose daily slope is strictly inside the percentile bounds.
///
/// `percentile` must be within `[0, 50]` (validated by `IndexConfig`). With
/// `0` the bounds are the min and max slope, so records sitting exactly on
/// either extreme are dropped as well.
pub fn filter_outliers(changes: &[ChangeRecord], percentile: f64) -> FilteredChanges {
    let sloped: Vec<SlopedChange> = changes
        .iter()
        .map(|&record| SlopedChange {
            record,
            slope: record.daily_slope(),
        })
        .collect();

    let mut slopes: Vec<f64> = sloped.iter().map(|c| c.slope).collect();
    slopes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let (Some(lower), Some(upper)) = (
        percentile_sorted(&slopes, percentile),
        percentile_sorted(&slopes, 100.0 - percentile),
    ) else {
        return FilteredChanges::default();
    };

    let kept = sloped
        .into_iter()
        .filter(|c| c.slope > lower && c.slope < upper)
        .collect();

    FilteredChanges {
        kept,
        bounds: Some((lower, upper)),
    }
}
