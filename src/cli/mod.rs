//! Command-line parsing for the `pidx` price index tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! index/scoring code. Conversion into run configs happens in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::DEFAULT_OUTLIERS_PERCENTILE;
use crate::io::ingest::parse_date;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pidx", version, about = "Purchase price index builder and price predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the index from a purchase history CSV, print diagnostics, and optionally plot/export.
    Index(IndexArgs),
    /// Predict an item's price on a date.
    Predict(PredictArgs),
    /// Compare the index model against simple baselines on a time split.
    Bench(BenchArgs),
    /// Write a synthetic purchase history CSV.
    Sample(SampleArgs),
    /// Plot a previously exported index JSON.
    Plot(PlotArgs),
}

/// Input file and index horizon, shared by commands that build an index.
#[derive(Debug, Args, Clone)]
pub struct HorizonArgs {
    /// Purchase history CSV (columns: item_id, date, price).
    #[arg(short = 'i', long, env = "PIDX_INPUT", value_name = "CSV")]
    pub input: PathBuf,

    /// First day of the index (default: 1 January of the earliest observation's year).
    #[arg(long, value_parser = parse_date)]
    pub min_date: Option<NaiveDate>,

    /// Last day of the index (default: today + 3 years).
    #[arg(long, value_parser = parse_date)]
    pub max_date: Option<NaiveDate>,

    /// Percentile trimmed from each tail of the daily slope distribution.
    #[arg(long, env = "PIDX_OUTLIERS_PERCENTILE", default_value_t = DEFAULT_OUTLIERS_PERCENTILE)]
    pub outliers_percentile: f64,

    /// Directory for cached indexes (rebuilt once per day).
    #[arg(long, env = "PIDX_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Rebuild the index even when the cache holds a fresh one.
    #[arg(long)]
    pub refresh: bool,
}

/// Options for `pidx index`.
#[derive(Debug, Args, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub horizon: HorizonArgs,

    /// Export the daily index to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the index (config + stats + curve) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Also plot the daily rates the index was compounded from.
    #[arg(long)]
    pub rates: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `pidx predict`.
#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub horizon: HorizonArgs,

    /// Item identifier as it appears in the input.
    #[arg(long)]
    pub item: String,

    /// Target date (default: today).
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Export the item's predicted price for every day of the horizon.
    #[arg(long = "path-csv", value_name = "CSV")]
    pub path_csv: Option<PathBuf>,

    /// Plot the item's price path with its observed prices.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `pidx bench`.
#[derive(Debug, Args, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub horizon: HorizonArgs,

    /// Rows dated before this day train the models; the rest are scored.
    #[arg(long, value_parser = parse_date)]
    pub split_date: NaiveDate,

    /// Export per-row predictions of every model to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for `pidx sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of distinct items.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub items: usize,

    /// Random seed for reproducible samples.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First order date (default: 1 January, three years ago).
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last order date (default: today).
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Expected yearly market drift (0.08 = +8%).
    #[arg(long, default_value_t = 0.08)]
    pub annual_drift: f64,

    /// Daily log-volatility of the market level.
    #[arg(long, default_value_t = 0.002)]
    pub daily_vol: f64,

    /// Log-sigma of per-order price noise.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Mean number of orders per item.
    #[arg(long, default_value_t = 6.0)]
    pub mean_orders: f64,

    /// Probability of a same-day duplicate order.
    #[arg(long, default_value_t = 0.05)]
    pub duplicate_prob: f64,

    /// Probability of a mistyped price (jump outlier).
    #[arg(long, default_value_t = 0.02)]
    pub jump_prob: f64,
}

/// Options for plotting a saved index.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Index JSON file produced by `pidx index --export-json`.
    #[arg(long, value_name = "JSON")]
    pub index: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
