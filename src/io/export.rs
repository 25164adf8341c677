//! CSV exports of the index, item price paths, benchmark predictions and
//! observation sets (synthetic samples).
//!
//! The exports are meant to be easy to consume in spreadsheets or a dashboard.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Observation, PriceIndex};
use crate::error::Result;
use crate::scoring::PredictionRow;

#[derive(Serialize)]
struct IndexRow {
    date: NaiveDate,
    coefficient: f64,
    daily_rate: f64,
    observed: bool,
}

/// Write the daily index: `date,coefficient,daily_rate,observed`.
///
/// `daily_rate` is the rate applied on that day (fallback on unobserved days).
pub fn write_index_csv(path: &Path, index: &PriceIndex) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for p in index.curve.points() {
        let direct = index.daily_rates.get(p.date);
        writer.serialize(IndexRow {
            date: p.date,
            coefficient: p.coefficient,
            daily_rate: direct.unwrap_or(index.stats.fallback_rate),
            observed: direct.is_some(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct PathRow<'a> {
    item_id: &'a str,
    date: NaiveDate,
    price: f64,
}

/// Write one item's projected price for every day: `item_id,date,price`.
pub fn write_price_path_csv(path: &Path, item_id: &str, prices: &[(NaiveDate, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for &(date, price) in prices {
        writer.serialize(PathRow {
            item_id,
            date,
            price,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write benchmark rows: `model,item_id,date,actual,predicted`.
///
/// Rows without a prediction have an empty `predicted` field.
pub fn write_predictions_csv(path: &Path, rows: &[PredictionRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write observations in the ingest format: `item_id,date,price`.
pub fn write_observations_csv(path: &Path, observations: &[Observation]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for obs in observations {
        writer.serialize(obs)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::domain::IndexConfig;
    use crate::index::build_price_index;
    use crate::io::ingest::load_observations;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn observations_reload_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let obs = vec![
            Observation::new("bolt", d(2021, 1, 4), 1.25),
            Observation::new("nut", d(2021, 2, 1), 0.5),
        ];
        write_observations_csv(&path, &obs).unwrap();

        let ingest = load_observations(&path).unwrap();
        assert_eq!(ingest.observations, obs);
        assert!(ingest.row_errors.is_empty());
    }

    #[test]
    fn index_csv_marks_observed_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.csv");
        let config = IndexConfig::new(d(2021, 1, 1), d(2021, 1, 5)).with_outliers_percentile(0.0);
        let obs = vec![
            Observation::new("a", d(2021, 1, 1), 1.0),
            Observation::new("a", d(2021, 1, 3), 1.21),
            Observation::new("z", d(2021, 1, 1), 1.0),
            Observation::new("z", d(2021, 1, 2), 0.5),
            Observation::new("y", d(2021, 1, 1), 1.0),
            Observation::new("y", d(2021, 1, 2), 2.0),
        ];
        let index = build_price_index(&obs, &config).unwrap();
        write_index_csv(&path, &index).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,coefficient,daily_rate,observed");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("2021-01-01,1.0,"));
        assert!(lines[1].ends_with(",true"));
        assert!(lines[3].ends_with(",false"));
    }
}
