//! Pairwise change extraction.
//!
//! Observations are grouped per item, same-day recordings are collapsed to
//! their arithmetic mean price, and every consecutive pair of distinct dates
//! becomes one [`ChangeRecord`] carrying the price ratio.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{ChangeRecord, Observation};
use crate::math::arithmetic_mean;

/// Group observations by item id.
///
/// Item order is sorted (deterministic output); within an item the original
/// order is kept.
pub fn group_by_item(observations: &[Observation]) -> BTreeMap<&str, Vec<(NaiveDate, f64)>> {
    let mut groups: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry(obs.item_id.as_str())
            .or_default()
            .push((obs.date, obs.price));
    }
    groups
}

/// Collapse repeated dates into one mean price; output is sorted by date.
pub fn collapse_same_day(points: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for &(date, price) in points {
        by_date.entry(date).or_default().push(price);
    }
    by_date
        .into_iter()
        .filter_map(|(date, prices)| arithmetic_mean(&prices).map(|p| (date, p)))
        .collect()
}

/// Change records of a single item's (date, price) points.
pub fn item_changes(points: &[(NaiveDate, f64)]) -> Vec<ChangeRecord> {
    let collapsed = collapse_same_day(points);
    collapsed
        .windows(2)
        .map(|w| ChangeRecord {
            date_from: w[0].0,
            date_to: w[1].0,
            ratio: w[1].1 / w[0].1,
        })
        .collect()
}

/// Change records across all items.
pub fn extract_changes(observations: &[Observation]) -> Vec<ChangeRecord> {
    group_by_item(observations)
        .values()
        .flat_map(|points| item_changes(points))
        .collect()
}
