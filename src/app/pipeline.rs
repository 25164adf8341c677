//! Shared "index pipeline" logic used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> horizon resolution -> cached or fresh index build -> model
//!
//! The command handlers can then focus on presentation (printing, plots, exports).

use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate};
use tracing::info;

use crate::cache::{BuiltToday, CacheStatus, IndexRequest, JsonFileCache, cache_key, load_or_build};
use crate::domain::{DatasetStats, IndexConfig, MeanKind};
use crate::error::{AppError, IndexError};
use crate::index::build_price_index;
use crate::io::ingest::{IngestedData, load_observations};
use crate::models::{LastPriceModel, MeanPriceModel, PriceIndexModel, PricePredictor};
use crate::scoring::{BenchmarkReport, benchmark};

/// Days added to today for the default end of the horizon (three years).
pub const DEFAULT_HORIZON_DAYS: u64 = 3 * 366;

/// Resolved settings of one run that builds an index.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub outliers_percentile: f64,
    pub cache_dir: Option<PathBuf>,
    /// Rebuild even when the cache holds a fresh index.
    pub refresh: bool,
    pub today: NaiveDate,
}

impl RunConfig {
    /// Index settings as given, before horizon defaults are filled in.
    pub fn request(&self) -> IndexRequest {
        IndexRequest {
            min_date: self.min_date,
            max_date: self.max_date,
            outliers_percentile: self.outliers_percentile,
        }
    }
}

/// All computed outputs of a single index run.
#[derive(Debug, Clone)]
pub struct IndexRun {
    pub ingest: IngestedData,
    pub model: PriceIndexModel,
    /// `None` when caching is disabled.
    pub cache_status: Option<CacheStatus>,
}

/// A single item price prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub item_id: String,
    pub date: NaiveDate,
    pub price: f64,
    pub base_price: f64,
}

/// Outputs of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchRun {
    pub ingest: IngestedData,
    pub report: BenchmarkReport,
}

/// Fill in horizon defaults from the data and validate the result.
///
/// - `min_date`: 1 January of the earliest observation's year
/// - `max_date`: today + three years, extended to the latest observation
pub fn resolve_index_config(run: &RunConfig, stats: &DatasetStats) -> Result<IndexConfig, IndexError> {
    let min_date = match run.min_date {
        Some(d) => d,
        None => NaiveDate::from_ymd_opt(stats.date_min.year(), 1, 1).unwrap_or(stats.date_min),
    };
    let max_date = match run.max_date {
        Some(d) => d,
        None => run
            .today
            .checked_add_days(Days::new(DEFAULT_HORIZON_DAYS))
            .unwrap_or(run.today)
            .max(stats.date_max),
    };

    let config = IndexConfig::new(min_date, max_date).with_outliers_percentile(run.outliers_percentile);
    config.validate()?;
    Ok(config)
}

/// Execute the index pipeline and return the fitted model.
pub fn run_index(run: &RunConfig) -> Result<IndexRun, AppError> {
    let ingest = load_observations(&run.input)?;
    let config = resolve_index_config(run, &ingest.stats)?;
    info!(
        rows = ingest.rows_used,
        skipped = ingest.row_errors.len(),
        min_date = %config.min_date,
        max_date = %config.max_date,
        "loaded observations"
    );

    let build = || build_price_index(&ingest.observations, &config);
    let (index, cache_status) = match &run.cache_dir {
        Some(dir) => {
            let cache = JsonFileCache::new(dir);
            let key = cache_key(&input_label(&run.input), &run.request(), &ingest.observations);
            let (index, status) = load_or_build(&cache, &BuiltToday, &key, run.today, run.refresh, build)?;
            (index, Some(status))
        }
        None => (build()?, None),
    };

    let model = PriceIndexModel::from_index(index, &ingest.observations)?;
    Ok(IndexRun {
        ingest,
        model,
        cache_status,
    })
}

/// Predict one item's price on `date` from a finished index run.
pub fn predict_item(run: &IndexRun, item_id: &str, date: NaiveDate) -> Result<Prediction, AppError> {
    let price = run.model.predict(item_id, date)?;
    let base_price = run.model.base_price(item_id)?;
    Ok(Prediction {
        item_id: item_id.to_string(),
        date,
        price,
        base_price,
    })
}

/// Models compared by `pidx bench`, index model first.
pub fn benchmark_models(config: IndexConfig) -> Vec<Box<dyn PricePredictor>> {
    vec![
        Box::new(PriceIndexModel::new(config)),
        Box::new(MeanPriceModel::new(MeanKind::Geometric)),
        Box::new(MeanPriceModel::new(MeanKind::Arithmetic)),
        Box::new(LastPriceModel::new()),
    ]
}

/// Execute the benchmark pipeline.
///
/// The horizon is resolved over the whole file so test dates stay inside it.
pub fn run_bench(run: &RunConfig, split_date: NaiveDate) -> Result<BenchRun, AppError> {
    let ingest = load_observations(&run.input)?;
    let config = resolve_index_config(run, &ingest.stats)?;
    if !config.contains(split_date) {
        return Err(IndexError::InvalidConfig(format!(
            "Split date {split_date} lies outside the index horizon [{}, {}].",
            config.min_date, config.max_date
        ))
        .into());
    }

    let mut models = benchmark_models(config);
    let report = benchmark(&mut models, &ingest.observations, split_date)?;
    Ok(BenchRun { ingest, report })
}

fn input_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}
