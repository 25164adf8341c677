//! Price-index construction.
//!
//! Pipeline:
//!
//! - extract pairwise price changes per item (`changes`)
//! - drop changes with extreme daily slopes (`outliers`)
//! - spread slopes over calendar days and average per day (`daily`)
//! - compound daily rates over the horizon into a dense curve (`integrate`)

use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::{IndexConfig, IndexStats, Observation, PriceIndex};
use crate::error::{IndexError, Result};

pub mod changes;
pub mod daily;
pub mod integrate;
pub mod outliers;

pub use changes::*;
pub use daily::*;
pub use integrate::*;
pub use outliers::*;

/// Reject inputs the engine cannot index.
///
/// On top of [`validate_prices`], every observation must fall inside the
/// configured horizon (its deflation coefficient must exist).
pub fn validate_observations(observations: &[Observation], config: &IndexConfig) -> Result<()> {
    validate_prices(observations)?;
    if let Some(obs) = observations.iter().find(|o| !config.contains(o.date)) {
        return Err(IndexError::DataError(format!(
            "Item '{}' observed on {}, outside the index horizon [{}, {}].",
            obs.item_id, obs.date, config.min_date, config.max_date
        )));
    }
    Ok(())
}

/// Observations must be non-empty and carry an item id and a finite positive price.
pub fn validate_prices(observations: &[Observation]) -> Result<()> {
    if observations.is_empty() {
        return Err(IndexError::DataError("No observations to fit.".to_string()));
    }
    for obs in observations {
        if obs.item_id.trim().is_empty() {
            return Err(IndexError::DataError(format!(
                "Observation on {} has an empty item id.",
                obs.date
            )));
        }
        if !(obs.price.is_finite() && obs.price > 0.0) {
            return Err(IndexError::DataError(format!(
                "Item '{}' has a non-positive price {} on {}.",
                obs.item_id, obs.price, obs.date
            )));
        }
    }
    Ok(())
}

/// Build a price index from observations.
pub fn build_price_index(observations: &[Observation], config: &IndexConfig) -> Result<PriceIndex> {
    config.validate()?;
    validate_observations(observations, config)?;

    let changes = extract_changes(observations);
    let n_items = observations
        .iter()
        .map(|o| o.item_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let n_items_with_changes = group_by_item(observations)
        .values()
        .filter(|points| collapse_same_day(points).len() >= 2)
        .count();
    debug!(
        observations = observations.len(),
        items = n_items,
        changes = changes.len(),
        "extracted price changes"
    );

    let filtered = filter_outliers(&changes, config.outliers_percentile);
    debug!(
        retained = filtered.kept.len(),
        bounds = ?filtered.bounds,
        "filtered outliers"
    );

    let daily_rates = aggregate_daily_rates(&filtered.kept);
    let fallback = fallback_rate(&daily_rates);
    let curve = integrate(&daily_rates, config.min_date, config.max_date, fallback);
    if let Some(p) = curve
        .points()
        .iter()
        .find(|p| !(p.coefficient.is_finite() && p.coefficient > 0.0))
    {
        return Err(IndexError::DataError(format!(
            "Index coefficient on {} is {}: retained price changes compound out of range over [{}, {}].",
            p.date, p.coefficient, config.min_date, config.max_date
        )));
    }

    let rate_days = daily_rates
        .iter()
        .filter(|(day, _)| config.contains(*day))
        .count();

    info!(
        days = curve.len(),
        rate_days,
        fallback_rate = fallback,
        "built price index"
    );

    Ok(PriceIndex {
        config: *config,
        daily_rates,
        curve,
        stats: IndexStats {
            n_observations: observations.len(),
            n_items,
            n_items_with_changes,
            changes_extracted: changes.len(),
            changes_retained: filtered.kept.len(),
            slope_bounds: filtered.bounds,
            rate_days,
            fallback_rate: fallback,
        },
    })
}
