//! Index-normalized price model.
//!
//! `fit` builds the price index and keeps every training observation grouped
//! per item. `predict` deflates an item's historical prices by the index
//! coefficient of their dates, takes the geometric mean of the deflated values
//! (the item's base price) and re-inflates it with the coefficient of the
//! requested date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{IndexConfig, Observation, PriceIndex};
use crate::error::{IndexError, Result};
use crate::index::{build_price_index, group_by_item, validate_observations};
use crate::math::geometric_mean_iter;
use crate::models::PricePredictor;

/// Fitted state: the index plus the raw training points per item.
#[derive(Debug, Clone)]
pub struct FittedIndex {
    index: PriceIndex,
    items: BTreeMap<String, Vec<(NaiveDate, f64)>>,
}

impl FittedIndex {
    fn new(index: PriceIndex, observations: &[Observation]) -> Self {
        let items = group_by_item(observations)
            .into_iter()
            .map(|(id, points)| (id.to_string(), points))
            .collect();
        Self { index, items }
    }

    pub fn index(&self) -> &PriceIndex {
        &self.index
    }

    fn item_points(&self, item_id: &str) -> Result<&[(NaiveDate, f64)]> {
        self.items
            .get(item_id)
            .map(Vec::as_slice)
            .ok_or_else(|| IndexError::UnknownItem(item_id.to_string()))
    }

    fn base_price(&self, item_id: &str) -> Result<f64> {
        let points = self.item_points(item_id)?;
        let deflated = points
            .iter()
            .map(|&(date, price)| Ok(price / self.index.curve.coefficient(date)?))
            .collect::<Result<Vec<f64>>>()?;
        geometric_mean_iter(deflated).ok_or_else(|| {
            IndexError::DataError(format!("Item '{item_id}' has no usable prices."))
        })
    }
}

/// Price model driven by the daily price index.
#[derive(Debug, Clone)]
pub struct PriceIndexModel {
    config: IndexConfig,
    fitted: Option<FittedIndex>,
}

impl PriceIndexModel {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Build a fitted model from an index built elsewhere (e.g. the cache).
    ///
    /// The observations must lie inside the index horizon.
    pub fn from_index(index: PriceIndex, observations: &[Observation]) -> Result<Self> {
        validate_observations(observations, &index.config)?;
        Ok(Self {
            config: index.config,
            fitted: Some(FittedIndex::new(index, observations)),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> Result<&FittedIndex> {
        self.fitted.as_ref().ok_or(IndexError::UnfitModel)
    }

    /// Fit on `observations`.
    ///
    /// The new state is built first and swapped in on success, so a failed
    /// fit leaves the model as it was.
    pub fn fit(&mut self, observations: &[Observation]) -> Result<()> {
        let index = build_price_index(observations, &self.config)?;
        self.fitted = Some(FittedIndex::new(index, observations));
        Ok(())
    }

    /// Projected price of `item_id` on `date`.
    pub fn predict(&self, item_id: &str, date: NaiveDate) -> Result<f64> {
        let fitted = self.fitted()?;
        let base = fitted.base_price(item_id)?;
        let target = fitted.index.curve.coefficient(date)?;
        debug!(item = item_id, %date, base, target, "predicted price");
        Ok(base * target)
    }

    /// The item's deflated (scale-invariant) base price.
    pub fn base_price(&self, item_id: &str) -> Result<f64> {
        self.fitted()?.base_price(item_id)
    }

    /// Projected price of `item_id` for every day of the horizon.
    pub fn price_path(&self, item_id: &str) -> Result<Vec<(NaiveDate, f64)>> {
        let fitted = self.fitted()?;
        let base = fitted.base_price(item_id)?;
        Ok(fitted
            .index
            .curve
            .points()
            .iter()
            .map(|p| (p.date, base * p.coefficient))
            .collect())
    }

    /// Training observations of `item_id`, in input order.
    pub fn item_observations(&self, item_id: &str) -> Result<&[(NaiveDate, f64)]> {
        self.fitted()?.item_points(item_id)
    }

    pub fn index(&self) -> Result<&PriceIndex> {
        Ok(self.fitted()?.index())
    }

    /// Sorted ids of all training items.
    pub fn items(&self) -> Result<Vec<&str>> {
        Ok(self.fitted()?.items.keys().map(String::as_str).collect())
    }
}

impl PricePredictor for PriceIndexModel {
    fn name(&self) -> &str {
        "price-index"
    }

    fn fit(&mut self, observations: &[Observation]) -> Result<()> {
        PriceIndexModel::fit(self, observations)
    }

    fn predict(&self, item_id: &str, date: NaiveDate) -> Result<f64> {
        PriceIndexModel::predict(self, item_id, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config() -> IndexConfig {
        IndexConfig::new(d(2019, 1, 1), d(2024, 12, 31)).with_outliers_percentile(0.0)
    }

    fn market() -> Vec<Observation> {
        let mut obs = Vec::new();
        // Several items drifting up ~10% a year with different base prices.
        for (i, base) in [10.0, 50.0, 200.0, 1000.0].iter().enumerate() {
            let id = format!("item-{i}");
            for (k, month) in [1u32, 4, 7, 10].iter().enumerate() {
                let date = d(2021, *month, 1 + i as u32);
                let days = (date - d(2021, 1, 1)).num_days() as f64;
                let noise = if k % 2 == 0 { 1.01 } else { 0.99 };
                obs.push(Observation::new(&id, date, base * 1.1_f64.powf(days / 365.0) * noise));
            }
        }
        obs
    }

    #[test]
    fn unfit_model_refuses_to_predict() {
        let model = PriceIndexModel::new(config());
        assert!(matches!(model.predict("x", d(2021, 1, 1)), Err(IndexError::UnfitModel)));
        assert!(matches!(model.items(), Err(IndexError::UnfitModel)));
    }

    #[test]
    fn single_observation_round_trips() {
        let mut model = PriceIndexModel::new(config());
        let mut obs = market();
        obs.push(Observation::new("solo", d(2022, 3, 14), 42.0));
        model.fit(&obs).unwrap();

        let p = model.predict("solo", d(2022, 3, 14)).unwrap();
        assert!((p - 42.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_item_and_out_of_range() {
        let mut model = PriceIndexModel::new(config());
        model.fit(&market()).unwrap();

        assert!(matches!(
            model.predict("B", d(2021, 1, 1)),
            Err(IndexError::UnknownItem(id)) if id == "B"
        ));
        assert!(matches!(
            model.predict("item-0", d(2030, 1, 1)),
            Err(IndexError::DateOutOfRange { .. })
        ));
        // An unseen item reports as unknown even when the date is also out of range.
        assert!(matches!(
            model.predict("B", d(2030, 1, 1)),
            Err(IndexError::UnknownItem(_))
        ));
    }

    #[test]
    fn extrapolates_before_and_after_observations() {
        let mut model = PriceIndexModel::new(config());
        model.fit(&market()).unwrap();

        let early = model.predict("item-1", d(2019, 6, 1)).unwrap();
        let late = model.predict("item-1", d(2024, 6, 1)).unwrap();
        assert!(early.is_finite() && early > 0.0);
        assert!(late.is_finite() && late > 0.0);
        // The market drifts upward, so does the projection.
        assert!(late > early);
    }

    #[test]
    fn failed_refit_keeps_previous_state() {
        let mut model = PriceIndexModel::new(config());
        model.fit(&market()).unwrap();
        let before = model.predict("item-2", d(2023, 1, 1)).unwrap();

        let bad = vec![Observation::new("item-2", d(2021, 1, 1), 0.0)];
        assert!(matches!(model.fit(&bad), Err(IndexError::DataError(_))));
        assert_eq!(model.predict("item-2", d(2023, 1, 1)).unwrap(), before);
    }

    #[test]
    fn price_path_matches_predict() {
        let mut model = PriceIndexModel::new(config());
        model.fit(&market()).unwrap();

        let path = model.price_path("item-3").unwrap();
        assert_eq!(path.len(), config().horizon_days());
        let (date, price) = path[800];
        assert!((model.predict("item-3", date).unwrap() - price).abs() < 1e-9);
    }

    #[test]
    fn from_index_matches_fit() {
        let obs = market();
        let mut fitted = PriceIndexModel::new(config());
        fitted.fit(&obs).unwrap();

        let index = build_price_index(&obs, &config()).unwrap();
        let restored = PriceIndexModel::from_index(index, &obs).unwrap();
        assert_eq!(
            fitted.predict("item-0", d(2024, 1, 1)).unwrap(),
            restored.predict("item-0", d(2024, 1, 1)).unwrap()
        );
    }
}
