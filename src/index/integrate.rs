//! Index integration over the calendar.
//!
//! Starting at `1.0` on `min_date`, the running coefficient is recorded for
//! each day and then multiplied by that day's rate. Days missing from the rate
//! table use the fallback rate (geometric mean of all table entries), which is
//! also what extends the curve before the first and after the last evidence.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{CurvePoint, DailyRateTable, IndexCurve};
use crate::math::geometric_mean_iter;

/// Rate assumed on days without direct evidence.
///
/// Falls back to `1.0` (flat) when the table is empty.
pub fn fallback_rate(table: &DailyRateTable) -> f64 {
    match geometric_mean_iter(table.iter().map(|(_, r)| r)) {
        Some(rate) => rate,
        None => {
            warn!("daily rate table is empty; index will be flat");
            1.0
        }
    }
}

/// Walk `[min_date, max_date]` and compound daily rates.
///
/// Callers must ensure `min_date <= max_date` (see `IndexConfig::validate`).
pub fn integrate(
    table: &DailyRateTable,
    min_date: NaiveDate,
    max_date: NaiveDate,
    fallback: f64,
) -> IndexCurve {
    let n_days = ((max_date - min_date).num_days() + 1).max(1) as usize;
    let mut points = Vec::with_capacity(n_days);
    let mut running = 1.0_f64;

    for day in min_date.iter_days().take(n_days) {
        points.push(CurvePoint {
            date: day,
            coefficient: running,
        });
        running *= table.get(day).unwrap_or(fallback);
    }

    IndexCurve::from_dense(points)
}
