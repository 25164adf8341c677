//! Price prediction models.
//!
//! Every model implements [`PricePredictor`] so the benchmark can run them
//! side by side. `predict` takes `&self`: a fitted model can serve
//! predictions from several threads at once.

use chrono::NaiveDate;

use crate::domain::Observation;
use crate::error::Result;

pub mod baseline;
pub mod price_index;

pub use baseline::*;
pub use price_index::*;

/// A model that learns per-item prices from observations.
pub trait PricePredictor: Send + Sync {
    /// Short label used in reports.
    fn name(&self) -> &str;

    /// Replace the model state with one learned from `observations`.
    fn fit(&mut self, observations: &[Observation]) -> Result<()>;

    /// Predicted price of `item_id` on `date`.
    fn predict(&self, item_id: &str, date: NaiveDate) -> Result<f64>;
}
