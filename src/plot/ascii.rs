//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid with deterministic output, so plots can be
//! checked with golden tests.
//!
//! Plot elements:
//! - index curve or price path: `-` line
//! - observed prices: `o`
//! - daily rates: `o`, over a `-` line at the fallback rate
//! - marker date (usually today): `|` column

use chrono::NaiveDate;

use crate::domain::{CurvePoint, DailyRateTable};

/// Render an index curve, optionally marking one date with a vertical bar.
pub fn render_index_plot(
    curve: &[CurvePoint],
    width: usize,
    height: usize,
    marker: Option<NaiveDate>,
) -> String {
    let series: Vec<(NaiveDate, f64)> = curve.iter().map(|p| (p.date, p.coefficient)).collect();
    let Some((start, end)) = date_range(&series, &[]) else {
        return "Index: (empty)\n".to_string();
    };
    let (grid, y_min, y_max) = render_grid(&series, &[], start, end, width, height, marker);
    finish("Index", start, end, "coef", y_min, y_max, 3, grid)
}

/// Render an item's predicted price path with its observed prices overlaid.
pub fn render_price_plot(
    path: &[(NaiveDate, f64)],
    observed: &[(NaiveDate, f64)],
    width: usize,
    height: usize,
    marker: Option<NaiveDate>,
) -> String {
    let Some((start, end)) = date_range(path, observed) else {
        return "Price: (empty)\n".to_string();
    };
    let (grid, y_min, y_max) = render_grid(path, observed, start, end, width, height, marker);
    finish("Price", start, end, "price", y_min, y_max, 3, grid)
}

/// Render the sparse daily rate table against the fallback rate.
///
/// Rates sit close to 1.0, so the header range carries six decimals.
pub fn render_rate_plot(rates: &DailyRateTable, fallback_rate: f64, width: usize, height: usize) -> String {
    let points: Vec<(NaiveDate, f64)> = rates.iter().collect();
    let Some((start, end)) = date_range(&points, &[]) else {
        return "Rates: (empty)\n".to_string();
    };
    let reference = [(start, fallback_rate), (end, fallback_rate)];
    let (grid, y_min, y_max) = render_grid(&reference, &points, start, end, width, height, None);
    finish("Rates", start, end, "rate", y_min, y_max, 6, grid)
}

fn finish(
    title: &str,
    start: NaiveDate,
    end: NaiveDate,
    y_label: &str,
    y_min: f64,
    y_max: f64,
    precision: usize,
    grid: Vec<Vec<char>>,
) -> String {
    let mut out = format!("{title}: {start} .. {end} | {y_label}=[{y_min:.precision$}, {y_max:.precision$}]\n");
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn render_grid(
    series: &[(NaiveDate, f64)],
    points: &[(NaiveDate, f64)],
    start: NaiveDate,
    end: NaiveDate,
    width: usize,
    height: usize,
    marker: Option<NaiveDate>,
) -> (Vec<Vec<char>>, f64, f64) {
    let width = width.max(10);
    let height = height.max(5);

    let x_max = (end - start).num_days().max(1) as f64;
    let (y_min, y_max) = y_range(series, points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let to_x = |d: NaiveDate| map_x((d - start).num_days() as f64, 0.0, x_max, width);

    let mut prev = None;
    for &(date, y) in series {
        let x = to_x(date);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, row, '-'),
            None => grid[row][x] = '-',
        }
        prev = Some((x, row));
    }

    for &(date, y) in points {
        grid[map_y(y, y_min, y_max, height)][to_x(date)] = 'o';
    }

    if let Some(m) = marker.filter(|m| *m >= start && *m <= end) {
        let x = to_x(m);
        for row in grid.iter_mut() {
            if row[x] == ' ' {
                row[x] = '|';
            }
        }
    }

    (grid, y_min, y_max)
}

fn date_range(series: &[(NaiveDate, f64)], points: &[(NaiveDate, f64)]) -> Option<(NaiveDate, NaiveDate)> {
    let dates = series.iter().chain(points).map(|&(d, _)| d);
    let start = dates.clone().min()?;
    let end = dates.max()?;
    Some((start, end))
}

fn y_range(series: &[(NaiveDate, f64)], points: &[(NaiveDate, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in series.iter().chain(points) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() && min_y == max_y {
        // Flat series: centre it.
        Some((min_y - 0.5, max_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<CurvePoint> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        (0..10)
            .map(|i| CurvePoint {
                date: start + chrono::Days::new(i),
                coefficient: 1.0 + 0.1 * i as f64,
            })
            .collect()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let txt = render_index_plot(&ramp(), 10, 5, None);
        let mut lines = txt.lines();
        assert!(lines.next().unwrap().starts_with("Index: 2021-01-01 .. 2021-01-10 | coef=[0.955, "));
        let body: Vec<&str> = lines.collect();
        assert_eq!(
            body,
            vec![
                "         -",
                "      --- ",
                "    --    ",
                " ---      ",
                "-         ",
            ]
        );
    }

    #[test]
    fn marker_fills_blank_cells_only() {
        let marker = NaiveDate::from_ymd_opt(2021, 1, 5);
        let txt = render_index_plot(&ramp(), 10, 5, marker);
        let column: String = txt.lines().skip(1).map(|l| l.chars().nth(4).unwrap()).collect();
        assert_eq!(column, "||-||");

        let outside = NaiveDate::from_ymd_opt(2022, 1, 1);
        assert!(!render_index_plot(&ramp(), 10, 5, outside).contains('|'));
    }

    #[test]
    fn observed_points_overlay_path() {
        let d = |day| NaiveDate::from_ymd_opt(2021, 1, day).unwrap();
        let path = vec![(d(1), 10.0), (d(10), 20.0)];
        let observed = vec![(d(1), 10.0), (d(10), 20.0)];
        let txt = render_price_plot(&path, &observed, 10, 5, None);
        let body: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(body.first().unwrap().chars().last(), Some('o'));
        assert_eq!(body.last().unwrap().chars().next(), Some('o'));
    }

    #[test]
    fn empty_inputs_do_not_panic() {
        assert_eq!(render_index_plot(&[], 10, 5, None), "Index: (empty)\n");
        assert_eq!(render_price_plot(&[], &[], 10, 5, None), "Price: (empty)\n");
        assert_eq!(render_rate_plot(&DailyRateTable::default(), 1.0, 10, 5), "Rates: (empty)\n");
    }

    #[test]
    fn rates_scatter_around_fallback_line() {
        let d = |day| NaiveDate::from_ymd_opt(2021, 1, day).unwrap();
        let rates = DailyRateTable::from_map([(d(1), 1.002), (d(10), 0.998)].into_iter().collect());
        let txt = render_rate_plot(&rates, 1.0, 10, 5);
        let mut lines = txt.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Rates: 2021-01-01 .. 2021-01-10 | rate=[0.997800, 1.002200]"
        );
        let body: Vec<&str> = lines.collect();
        assert_eq!(
            body,
            vec![
                "o         ",
                "          ",
                "----------",
                "          ",
                "         o",
            ]
        );
    }
}
