//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - runs the index/predict/bench pipelines
//! - prints reports/plots
//! - writes optional exports

use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{BenchArgs, Command, HorizonArgs, IndexArgs, PlotArgs, PredictArgs, SampleArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::error::AppError;

pub mod pipeline;

use pipeline::RunConfig;

/// Rows listed when reporting skipped input lines.
const MAX_ROW_ERRORS_SHOWN: usize = 10;

/// Entry point for the `pidx` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    let today = Local::now().date_naive();

    match cli.command {
        Command::Index(args) => handle_index(args, today),
        Command::Predict(args) => handle_predict(args, today),
        Command::Bench(args) => handle_bench(args, today),
        Command::Sample(args) => handle_sample(args, today),
        Command::Plot(args) => handle_plot(args, today),
    }
}

/// Logs go to stderr so reports on stdout stay pipeable. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed (e.g. when embedded); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_index(args: IndexArgs, today: NaiveDate) -> Result<(), AppError> {
    let config = run_config_from_args(&args.horizon, today);
    let run = pipeline::run_index(&config)?;
    let index = run.model.index()?;
    if let Some(status) = run.cache_status {
        info!(?status, "index cache");
    }

    println!(
        "{}",
        crate::report::format_index_summary(&run.ingest, index, today)
    );
    let skipped = crate::report::format_row_errors(&run.ingest.row_errors, MAX_ROW_ERRORS_SHOWN);
    if !skipped.is_empty() {
        println!("{skipped}");
    }

    if !args.no_plot {
        let plot = crate::plot::render_index_plot(index.curve.points(), args.width, args.height, Some(today));
        println!("{plot}");
    }
    if args.rates {
        let plot = crate::plot::render_rate_plot(&index.daily_rates, index.stats.fallback_rate, args.width, args.height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &args.export_csv {
        crate::io::export::write_index_csv(path, index)?;
    }
    if let Some(path) = &args.export_json {
        crate::io::index_file::write_index_json(path, index, today)?;
    }

    Ok(())
}

fn handle_predict(args: PredictArgs, today: NaiveDate) -> Result<(), AppError> {
    let config = run_config_from_args(&args.horizon, today);
    let run = pipeline::run_index(&config)?;
    let date = args.date.unwrap_or(today);

    let prediction = pipeline::predict_item(&run, &args.item, date)?;
    println!(
        "{}",
        crate::report::format_prediction(
            &prediction.item_id,
            prediction.date,
            prediction.price,
            prediction.base_price
        )
    );

    if args.plot || args.path_csv.is_some() {
        let path = run.model.price_path(&args.item)?;
        if args.plot {
            let observed = run.model.item_observations(&args.item)?;
            let plot = crate::plot::render_price_plot(&path, observed, args.width, args.height, Some(date));
            println!("{plot}");
        }
        if let Some(out) = &args.path_csv {
            crate::io::export::write_price_path_csv(out, &args.item, &path)?;
        }
    }

    Ok(())
}

fn handle_bench(args: BenchArgs, today: NaiveDate) -> Result<(), AppError> {
    let config = run_config_from_args(&args.horizon, today);
    let run = pipeline::run_bench(&config, args.split_date)?;

    println!("{}", crate::report::format_benchmark(&run.report));
    let skipped = crate::report::format_row_errors(&run.ingest.row_errors, MAX_ROW_ERRORS_SHOWN);
    if !skipped.is_empty() {
        println!("{skipped}");
    }

    if let Some(path) = &args.export {
        crate::io::export::write_predictions_csv(path, &run.report.rows)?;
    }
    Ok(())
}

fn handle_sample(args: SampleArgs, today: NaiveDate) -> Result<(), AppError> {
    let config = sample_config_from_args(&args, today);
    let sample = generate_sample(&config)?;
    crate::io::export::write_observations_csv(&args.out, &sample.observations)?;

    let growth = sample.market.last().map(|p| p.coefficient).unwrap_or(1.0);
    println!(
        "Wrote {} observations for {} items to {} (market {} .. {}, level {:.4})",
        sample.observations.len(),
        config.n_items,
        args.out.display(),
        config.start,
        config.end,
        growth
    );
    Ok(())
}

fn handle_plot(args: PlotArgs, today: NaiveDate) -> Result<(), AppError> {
    let file = crate::io::index_file::read_index_json(&args.index)?;
    let plot = crate::plot::render_index_plot(&file.curve, args.width, args.height, Some(today));
    println!("{plot}");
    Ok(())
}

pub fn run_config_from_args(args: &HorizonArgs, today: NaiveDate) -> RunConfig {
    RunConfig {
        input: args.input.clone(),
        min_date: args.min_date,
        max_date: args.max_date,
        outliers_percentile: args.outliers_percentile,
        cache_dir: args.cache_dir.clone(),
        refresh: args.refresh,
        today,
    }
}

/// Defaults: `start` = 1 January three years back, `end` = today.
pub fn sample_config_from_args(args: &SampleArgs, today: NaiveDate) -> SampleConfig {
    let start = args
        .start
        .or_else(|| NaiveDate::from_ymd_opt(today.year() - 3, 1, 1))
        .unwrap_or(today);
    let end = args.end.unwrap_or(today);

    SampleConfig {
        n_items: args.items,
        seed: args.seed,
        annual_drift: args.annual_drift,
        daily_vol: args.daily_vol,
        noise: args.noise,
        mean_orders: args.mean_orders,
        duplicate_prob: args.duplicate_prob,
        jump_prob: args.jump_prob,
        ..SampleConfig::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sample_defaults_cover_three_years() {
        let cli = Cli::try_parse_from(["pidx", "sample", "--out", "s.csv", "--items", "5"]).unwrap();
        let Command::Sample(args) = cli.command else {
            panic!("expected sample command");
        };
        let config = sample_config_from_args(&args, d(2024, 7, 1));
        assert_eq!(config.start, d(2021, 1, 1));
        assert_eq!(config.end, d(2024, 7, 1));
        assert_eq!(config.n_items, 5);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn run_config_carries_horizon_args() {
        let cli = Cli::try_parse_from([
            "pidx",
            "index",
            "--input",
            "orders.csv",
            "--min-date",
            "2020-01-01",
            "--outliers-percentile",
            "5",
        ])
        .unwrap();
        let Command::Index(args) = cli.command else {
            panic!("expected index command");
        };
        let config = run_config_from_args(&args.horizon, d(2024, 7, 1));
        assert_eq!(config.min_date, Some(d(2020, 1, 1)));
        assert_eq!(config.max_date, None);
        assert_eq!(config.outliers_percentile, 5.0);
        assert_eq!(config.today, d(2024, 7, 1));
        assert!(!config.refresh);
    }
}
