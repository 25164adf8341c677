//! Averaging and percentile helpers.
//!
//! Everything that averages ratios or multiplicative quantities goes through
//! [`geometric_mean`]: `exp(mean(ln x))`. The arithmetic mean is only used for
//! collapsing repeated recordings of one price.
//!
//! Numerical notes:
//! - The geometric mean is accumulated in log space, so long products of rates
//!   close to 1.0 do not lose precision or overflow.
//! - [`percentile`] uses linear interpolation between closest ranks
//!   (`rank = p/100 * (n - 1)`), the same convention as numpy's default.

use std::cmp::Ordering;

/// Geometric mean of strictly positive values.
///
/// Returns `None` for an empty input or if any value is non-positive or
/// non-finite.
pub fn geometric_mean(values: &[f64]) -> Option<f64> {
    geometric_mean_iter(values.iter().copied())
}

/// Geometric mean over an iterator (avoids collecting when the caller maps).
pub fn geometric_mean_iter<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sum_ln = 0.0;
    let mut n = 0usize;
    for v in values {
        if !(v.is_finite() && v > 0.0) {
            return None;
        }
        sum_ln += v.ln();
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some((sum_ln / n as f64).exp())
}

/// Arithmetic mean; `None` for an empty input.
pub fn arithmetic_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `p`-th percentile (0–100) with linear interpolation.
///
/// Returns `None` if `values` is empty or `p` is outside `[0, 100]`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    percentile_sorted(&sorted, p)
}

/// Same as [`percentile`] for an already ascending slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let rank = p / 100.0 * (sorted.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
