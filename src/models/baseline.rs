//! Comparison baselines that ignore market drift.
//!
//! Both baselines keep one number per item and return it for any date.
//! Unseen items are an explicit [`IndexError::UnknownItem`].

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{MeanKind, Observation};
use crate::error::{IndexError, Result};
use crate::index::{group_by_item, validate_prices};
use crate::math::{arithmetic_mean, geometric_mean};
use crate::models::PricePredictor;

/// Predicts an item's mean historical price.
#[derive(Debug, Clone)]
pub struct MeanPriceModel {
    kind: MeanKind,
    prices: Option<HashMap<String, f64>>,
}

impl MeanPriceModel {
    pub fn new(kind: MeanKind) -> Self {
        Self { kind, prices: None }
    }
}

impl PricePredictor for MeanPriceModel {
    fn name(&self) -> &str {
        match self.kind {
            MeanKind::Geometric => "mean-geometric",
            MeanKind::Arithmetic => "mean-arithmetic",
        }
    }

    fn fit(&mut self, observations: &[Observation]) -> Result<()> {
        validate_prices(observations)?;
        let mut prices = HashMap::new();
        for (id, points) in group_by_item(observations) {
            let values: Vec<f64> = points.iter().map(|&(_, p)| p).collect();
            let mean = match self.kind {
                MeanKind::Geometric => geometric_mean(&values),
                MeanKind::Arithmetic => arithmetic_mean(&values),
            };
            if let Some(mean) = mean {
                prices.insert(id.to_string(), mean);
            }
        }
        self.prices = Some(prices);
        Ok(())
    }

    fn predict(&self, item_id: &str, _date: NaiveDate) -> Result<f64> {
        let prices = self.prices.as_ref().ok_or(IndexError::UnfitModel)?;
        prices
            .get(item_id)
            .copied()
            .ok_or_else(|| IndexError::UnknownItem(item_id.to_string()))
    }
}

/// Predicts the most recent observed price of an item.
///
/// Several recordings on the latest date are averaged.
#[derive(Debug, Clone, Default)]
pub struct LastPriceModel {
    prices: Option<HashMap<String, f64>>,
}

impl LastPriceModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PricePredictor for LastPriceModel {
    fn name(&self) -> &str {
        "last-price"
    }

    fn fit(&mut self, observations: &[Observation]) -> Result<()> {
        validate_prices(observations)?;
        let mut prices = HashMap::new();
        for (id, points) in group_by_item(observations) {
            let Some(last_date) = points.iter().map(|&(d, _)| d).max() else {
                continue;
            };
            let latest: Vec<f64> = points
                .iter()
                .filter(|&&(d, _)| d == last_date)
                .map(|&(_, p)| p)
                .collect();
            if let Some(price) = arithmetic_mean(&latest) {
                prices.insert(id.to_string(), price);
            }
        }
        self.prices = Some(prices);
        Ok(())
    }

    fn predict(&self, item_id: &str, _date: NaiveDate) -> Result<f64> {
        let prices = self.prices.as_ref().ok_or(IndexError::UnfitModel)?;
        prices
            .get(item_id)
            .copied()
            .ok_or_else(|| IndexError::UnknownItem(item_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn obs() -> Vec<Observation> {
        vec![
            Observation::new("A", d(2021, 1, 1), 100.0),
            Observation::new("A", d(2021, 2, 1), 400.0),
            Observation::new("A", d(2021, 2, 1), 200.0),
            Observation::new("B", d(2021, 1, 5), 7.0),
        ]
    }

    #[test]
    fn mean_kinds_differ() {
        let mut geo = MeanPriceModel::new(MeanKind::Geometric);
        geo.fit(&obs()).unwrap();
        let g = geo.predict("A", d(2022, 1, 1)).unwrap();
        assert!((g - 200.0).abs() < 1e-9);

        let mut ari = MeanPriceModel::new(MeanKind::Arithmetic);
        ari.fit(&obs()).unwrap();
        let a = ari.predict("A", d(2022, 1, 1)).unwrap();
        assert!((a - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn last_price_averages_final_day() {
        let mut model = LastPriceModel::new();
        model.fit(&obs()).unwrap();
        assert_eq!(model.predict("A", d(2030, 1, 1)).unwrap(), 300.0);
        assert_eq!(model.predict("B", d(2030, 1, 1)).unwrap(), 7.0);
    }

    #[test]
    fn absence_is_an_error_not_a_null() {
        let mut model = LastPriceModel::new();
        assert!(matches!(model.predict("A", d(2021, 1, 1)), Err(IndexError::UnfitModel)));
        model.fit(&obs()).unwrap();
        assert!(matches!(model.predict("Z", d(2021, 1, 1)), Err(IndexError::UnknownItem(_))));

        let mut mean = MeanPriceModel::new(MeanKind::Geometric);
        assert!(matches!(mean.fit(&[]), Err(IndexError::DataError(_))));
    }
}
