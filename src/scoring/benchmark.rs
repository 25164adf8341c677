//! Time-split benchmark of price models.
//!
//! Rows dated before the split date train every model; the remaining rows are
//! predicted and scored. A row without a prediction (unseen item, date outside
//! the horizon) does not fail the run, it lowers the model's coverage.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::domain::Observation;
use crate::error::{IndexError, Result};
use crate::models::PricePredictor;
use crate::scoring::metrics::{mape, rmspe};

/// Train/test partition by date.
#[derive(Debug, Clone)]
pub struct TimeSplit {
    pub train: Vec<Observation>,
    pub test: Vec<Observation>,
}

/// `train` gets `date < split_date`, `test` gets the rest.
pub fn split_by_date(observations: &[Observation], split_date: NaiveDate) -> TimeSplit {
    let (train, test): (Vec<Observation>, Vec<Observation>) = observations
        .iter()
        .cloned()
        .partition(|o| o.date < split_date);
    TimeSplit { train, test }
}

/// One scored test row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub model: String,
    pub item_id: String,
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: Option<f64>,
}

/// Scores of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    pub model: String,
    pub test_rows: usize,
    pub covered: usize,
    pub mape: Option<f64>,
    pub rmspe: Option<f64>,
}

impl ModelScore {
    pub fn coverage(&self) -> f64 {
        if self.test_rows == 0 {
            0.0
        } else {
            self.covered as f64 / self.test_rows as f64
        }
    }
}

/// Benchmark output.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub split_date: NaiveDate,
    pub train_rows: usize,
    pub test_rows: usize,
    pub scores: Vec<ModelScore>,
    pub rows: Vec<PredictionRow>,
}

/// Predict every test row with an already fitted model (in parallel).
pub fn predict_rows(model: &dyn PricePredictor, test: &[Observation]) -> Result<Vec<PredictionRow>> {
    test.par_iter()
        .map(|obs| {
            let predicted = match model.predict(&obs.item_id, obs.date) {
                Ok(p) => Some(p),
                Err(e) if e.is_no_prediction() => None,
                Err(e) => return Err(e),
            };
            Ok(PredictionRow {
                model: model.name().to_string(),
                item_id: obs.item_id.clone(),
                date: obs.date,
                actual: obs.price,
                predicted,
            })
        })
        .collect()
}

/// Score prediction rows of one model.
pub fn score_rows(model: &str, rows: &[PredictionRow]) -> Result<ModelScore> {
    let (actual, predicted): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(|r| r.predicted.map(|p| (r.actual, p)))
        .unzip();

    let (mape, rmspe) = if actual.is_empty() {
        (None, None)
    } else {
        (Some(mape(&actual, &predicted)?), Some(rmspe(&actual, &predicted)?))
    };

    Ok(ModelScore {
        model: model.to_string(),
        test_rows: rows.len(),
        covered: actual.len(),
        mape,
        rmspe,
    })
}

/// Fit each model on the train split and score it on the test split.
pub fn benchmark(
    models: &mut [Box<dyn PricePredictor>],
    observations: &[Observation],
    split_date: NaiveDate,
) -> Result<BenchmarkReport> {
    let split = split_by_date(observations, split_date);
    if split.train.is_empty() {
        return Err(IndexError::DataError(format!(
            "No training rows before {split_date}."
        )));
    }
    if split.test.is_empty() {
        return Err(IndexError::DataError(format!(
            "No test rows on or after {split_date}."
        )));
    }

    let mut scores = Vec::with_capacity(models.len());
    let mut rows = Vec::new();

    for model in models.iter_mut() {
        model.fit(&split.train)?;
        let model_rows = predict_rows(model.as_ref(), &split.test)?;
        let score = score_rows(model.name(), &model_rows)?;
        info!(
            model = %score.model,
            covered = score.covered,
            test_rows = score.test_rows,
            rmspe = ?score.rmspe,
            "scored model"
        );
        scores.push(score);
        rows.extend(model_rows);
    }

    Ok(BenchmarkReport {
        split_date,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        scores,
        rows,
    })
}
