//! CSV ingest and normalization.
//!
//! This module is responsible for turning a purchase-history CSV into a clean
//! set of `(item_id, date, price)` observations that are safe to index.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (rows keep file order)
//! - **Separation of concerns**: no index logic here

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{DatasetStats, Observation};
use crate::error::{IndexError, Result};

/// Accepted header names per logical column, in lookup order.
const ITEM_COLUMNS: [&str; 3] = ["item_id", "item", "name"];
const DATE_COLUMNS: [&str; 2] = ["date", "order_date"];
const PRICE_COLUMNS: [&str; 1] = ["price"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub item_id: Option<String>,
    pub message: String,
}

/// Ingest output: observations + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    item: usize,
    date: usize,
    price: usize,
}

/// Load observations from a CSV file.
pub fn load_observations(path: &Path) -> Result<IngestedData> {
    let file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_observations(file)
}

/// Load observations from any CSV reader.
pub fn read_observations<R: Read>(reader: R) -> Result<IngestedData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    item_id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, columns) {
            Ok(obs) => observations.push(obs),
            Err((item_id, message)) => row_errors.push(RowError {
                line,
                item_id,
                message,
            }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped invalid CSV rows");
    }

    let rows_used = observations.len();
    let stats = compute_stats(&observations).ok_or_else(|| {
        IndexError::DataError("No valid rows remain after normalization.".to_string())
    })?;
    debug!(rows_read, rows_used, items = stats.n_items, "ingested observations");

    Ok(IngestedData {
        observations,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns> {
    let find = |names: &[&str]| -> Result<usize> {
        names
            .iter()
            .find_map(|n| header_map.get(*n).copied())
            .ok_or_else(|| {
                IndexError::DataError(format!(
                    "Missing required column: `{}`",
                    names.join("` / `")
                ))
            })
    };
    Ok(Columns {
        item: find(&ITEM_COLUMNS)?,
        date: find(&DATE_COLUMNS)?,
        price: find(&PRICE_COLUMNS)?,
    })
}

fn parse_row(record: &StringRecord, columns: Columns) -> std::result::Result<Observation, (Option<String>, String)> {
    let item_id = get_value(record, columns.item)
        .ok_or_else(|| (None, "Missing required value: `item_id`".to_string()))?
        .to_string();

    let date = get_value(record, columns.date)
        .ok_or_else(|| "Missing required value: `date`".to_string())
        .and_then(parse_date)
        .map_err(|e| (Some(item_id.clone()), e))?;

    let price = get_value(record, columns.price)
        .ok_or_else(|| "Missing required value: `price`".to_string())
        .and_then(parse_price)
        .map_err(|e| (Some(item_id.clone()), e))?;

    Ok(Observation {
        item_id,
        date,
        price,
    })
}

fn get_value(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    // ISO dates are preferred, but purchase exports frequently use day-first
    // formats. The list is fixed so parsing stays deterministic.
    const FMTS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD, DD.MM.YYYY."
    ))
}

fn parse_price(s: &str) -> std::result::Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid price '{s}'."))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("Price must be finite and > 0, got '{s}'."))
    }
}

/// Summary stats over an observation set; `None` when empty.
pub fn compute_stats(observations: &[Observation]) -> Option<DatasetStats> {
    let first = observations.first()?;
    let mut date_min = first.date;
    let mut date_max = first.date;
    let mut price_min = f64::INFINITY;
    let mut price_max = f64::NEG_INFINITY;
    let mut items = HashSet::new();

    for o in observations {
        date_min = date_min.min(o.date);
        date_max = date_max.max(o.date);
        price_min = price_min.min(o.price);
        price_max = price_max.max(o.price);
        items.insert(o.item_id.as_str());
    }

    Some(DatasetStats {
        n_observations: observations.len(),
        n_items: items.len(),
        date_min,
        date_max,
        price_min,
        price_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_aliases_and_skips_bad_rows() {
        let csv = "\u{feff}Name,Order_Date,Price,Region\n\
                   bolt,2021-01-01,10.5,north\n\
                   bolt,15.02.2021,11,north\n\
                   nut,not-a-date,3,south\n\
                   nut,2021-03-01,-2,south\n\
                   ,2021-03-01,2,south\n\
                   nut,01/04/2021,2.5,south\n";
        let data = read_observations(csv.as_bytes()).unwrap();

        assert_eq!(data.rows_read, 6);
        assert_eq!(data.rows_used, 3);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 4);
        assert_eq!(data.row_errors[0].item_id.as_deref(), Some("nut"));
        assert_eq!(data.row_errors[2].item_id, None);

        assert_eq!(data.observations[1], Observation::new("bolt", d(2021, 2, 15), 11.0));
        assert_eq!(data.observations[2].date, d(2021, 4, 1));

        assert_eq!(data.stats.n_items, 2);
        assert_eq!(data.stats.date_min, d(2021, 1, 1));
        assert_eq!(data.stats.date_max, d(2021, 4, 1));
        assert_eq!(data.stats.price_max, 11.0);
    }

    #[test]
    fn unopenable_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_observations(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "item_id,price\nbolt,1\n";
        let err = read_observations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IndexError::DataError(msg) if msg.contains("date")));
    }

    #[test]
    fn no_usable_rows_is_fatal() {
        let csv = "item_id,date,price\nbolt,2021-01-01,0\n";
        assert!(matches!(
            read_observations(csv.as_bytes()),
            Err(IndexError::DataError(_))
        ));
    }
}
