//! Formatted terminal output.
//!
//! Formatting lives in one place so:
//! - the index and scoring code stays clean and testable
//! - output changes are localized (snapshot-style tests below)

use chrono::NaiveDate;

use crate::domain::PriceIndex;
use crate::io::ingest::{IngestedData, RowError};
use crate::report::summarize_index;
use crate::scoring::BenchmarkReport;

/// Format the index run summary (dataset stats + build diagnostics + headline numbers).
pub fn format_index_summary(ingest: &IngestedData, index: &PriceIndex, today: NaiveDate) -> String {
    let mut out = String::new();
    let stats = &ingest.stats;
    let build = &index.stats;
    let summary = summarize_index(index, today);

    out.push_str("=== pidx - Purchase Price Index ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Data: n={} items={} | dates=[{}, {}] | price=[{:.2}, {:.2}]\n",
        stats.n_observations, stats.n_items, stats.date_min, stats.date_max, stats.price_min, stats.price_max
    ));
    out.push_str(&format!(
        "Horizon: [{}, {}] ({} days) | outliers percentile={}\n",
        index.config.min_date,
        index.config.max_date,
        index.config.horizon_days(),
        index.config.outliers_percentile
    ));

    out.push_str("\nBuild diagnostics:\n");
    out.push_str(&format!(
        "- items with changes: {} of {}\n",
        build.n_items_with_changes, build.n_items
    ));
    out.push_str(&format!(
        "- changes: extracted={} retained={}\n",
        build.changes_extracted, build.changes_retained
    ));
    match build.slope_bounds {
        Some((lo, hi)) => out.push_str(&format!("- daily slope bounds: ({lo:.6}, {hi:.6})\n")),
        None => out.push_str("- daily slope bounds: n/a\n"),
    }
    out.push_str(&format!("- days with evidence: {}\n", build.rate_days));
    out.push_str(&format!(
        "- fallback rate: {:.8}/day ({})\n",
        summary.fallback_rate,
        fmt_pct(summary.annualized_fallback, "/yr")
    ));

    out.push_str("\nIndex:\n");
    if let Some((date, coef)) = summary.last_observed {
        out.push_str(&format!("- last evidence  {date}  {coef:.4}\n"));
    }
    match summary.at_reference {
        Some((date, coef)) => out.push_str(&format!("- today          {date}  {coef:.4}\n")),
        None => out.push_str(&format!("- today          {today}  outside horizon\n")),
    }
    let (end, end_coef) = summary.at_end;
    out.push_str(&format!("- horizon end    {end}  {end_coef:.4}\n"));

    out
}

/// Format one prediction with its decomposition into base price and coefficient.
pub fn format_prediction(item_id: &str, date: NaiveDate, price: f64, base_price: f64) -> String {
    let coefficient = if base_price > 0.0 { price / base_price } else { f64::NAN };
    let mut out = String::new();
    out.push_str(&format!("Item: {item_id}\n"));
    out.push_str(&format!("Date: {date}\n"));
    out.push_str(&format!("Base price: {base_price:.4}\n"));
    out.push_str(&format!("Coefficient: {coefficient:.6}\n"));
    out.push_str(&format!("Predicted price: {price:.4}\n"));
    out
}

/// Format the per-model benchmark table, best MAPE first.
pub fn format_benchmark(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Benchmark: split={} | train={} test={}\n\n",
        report.split_date, report.train_rows, report.test_rows
    ));

    out.push_str(
        format!(
            "{:<18} {:>8} {:>8} {:>9} {:>9} {:>9}\n",
            "model", "rows", "covered", "coverage", "MAPE", "RMSPE"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<18} {:-<8} {:-<8} {:-<9} {:-<9} {:-<9}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    let mut scores: Vec<_> = report.scores.iter().collect();
    scores.sort_by(|a, b| {
        let a = a.mape.unwrap_or(f64::INFINITY);
        let b = b.mape.unwrap_or(f64::INFINITY);
        a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
    });

    for s in scores {
        out.push_str(
            format!(
                "{:<18} {:>8} {:>8} {:>9} {:>9} {:>9}\n",
                truncate(&s.model, 18),
                s.test_rows,
                s.covered,
                fmt_pct(s.coverage(), ""),
                s.mape.map(|v| fmt_pct(v, "")).unwrap_or_else(|| "n/a".to_string()),
                s.rmspe.map(|v| fmt_pct(v, "")).unwrap_or_else(|| "n/a".to_string()),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format skipped input rows, listing at most `max` of them.
pub fn format_row_errors(errors: &[RowError], max: usize) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = format!("Skipped rows: {}\n", errors.len());
    for e in errors.iter().take(max) {
        match &e.item_id {
            Some(id) => out.push_str(&format!("  line {} ({}): {}\n", e.line, truncate(id, 24), e.message)),
            None => out.push_str(&format!("  line {}: {}\n", e.line, e.message)),
        }
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

fn fmt_pct(v: f64, suffix: &str) -> String {
    format!("{:.2}%{suffix}", v * 100.0)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
