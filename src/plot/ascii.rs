//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - yearly observations: `o`
//! - line between consecutive years: `-`
//! - ranking bars: `#`

use crate::domain::{Ranking, TimeSeries};
use crate::report::fmt_value;

/// Render a year-indexed series as a line chart on a `width` x `height` grid.
pub fn render_line_chart(series: &TimeSeries, width: usize, height: usize) -> String {
    if series.is_empty() {
        return format!("{}: no data\n", series.label);
    }

    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(&series.points);
    let (y_min, y_max) = y_range(&series.points);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let cells: Vec<(usize, usize)> = series
        .points
        .iter()
        .map(|&(year, v)| {
            (
                map_x(year as f64, x_min, x_max, width),
                map_y(v, y_min, y_max, height),
            )
        })
        .collect();

    // Line first, so points overlay it.
    for pair in cells.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let first = series.points[0].0;
    let last = series.points[series.points.len() - 1].0;
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | years=[{first}, {last}] | y=[{y_min:.2}, {y_max:.2}]\n",
        series.label
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Render a ranking as horizontal bars, largest on top.
///
/// `width` is the length of the longest bar; other bars scale linearly and
/// non-positive values draw no bar.
pub fn render_bar_chart(ranking: &Ranking, width: usize) -> String {
    if ranking.is_empty() {
        return format!("{}: no data\n", ranking.metric);
    }

    let width = width.max(1);
    let max = ranking
        .entries
        .iter()
        .map(|e| e.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let label_width = ranking
        .entries
        .iter()
        .map(|e| e.country.chars().count().min(MAX_LABEL))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let mut context: Vec<String> = Vec::new();
    if let Some(year) = ranking.year {
        context.push(year.to_string());
    }
    if !ranking.unit.is_empty() {
        context.push(ranking.unit.clone());
    }
    if context.is_empty() {
        out.push_str(&format!("{}\n", ranking.metric));
    } else {
        out.push_str(&format!("{} ({})\n", ranking.metric, context.join(", ")));
    }

    for e in ranking.entries.iter().rev() {
        let len = if max > 0.0 && e.value > 0.0 {
            ((e.value / max) * width as f64).round() as usize
        } else {
            0
        };
        let label: String = e.country.chars().take(MAX_LABEL).collect();
        out.push_str(&format!(
            "{label:<label_width$} |{} {}\n",
            "#".repeat(len),
            fmt_value(e.value)
        ));
    }

    out
}

const MAX_LABEL: usize = 24;

fn x_range(points: &[(i32, f64)]) -> (f64, f64) {
    let min = points.iter().map(|p| p.0).min().unwrap_or(0) as f64;
    let max = points.iter().map(|p| p.0).max().unwrap_or(0) as f64;
    if max > min { (min, max) } else { pad_range(min, max, 0.0) }
}

fn y_range(points: &[(i32, f64)]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() {
        (min_y, max_y)
    } else {
        (0.0, 1.0)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { min.abs().max(1.0) * 0.5 };
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

/// Integer line drawing (Bresenham-ish).
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
    use crate::domain::RankedEntry;

    #[test]
    fn line_chart_golden_snapshot_small() {
        let series = TimeSeries {
            label: "test".to_string(),
            points: vec![(2000, 0.0), (2004, 4.0)],
        };
        let txt = render_line_chart(&series, 10, 5);
        let expected = concat!(
            "Plot: test | years=[2000, 2004] | y=[-0.20, 4.20]\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn single_point_series_is_centered() {
        let series = TimeSeries {
            label: "one".to_string(),
            points: vec![(2020, 5.0)],
        };
        let txt = render_line_chart(&series, 11, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3], "     o     ");
    }

    #[test]
    fn empty_inputs_render_no_data() {
        assert_eq!(render_line_chart(&TimeSeries::empty("x"), 10, 5), "x: no data\n");
        assert_eq!(render_bar_chart(&Ranking::empty("m"), 10), "m: no data\n");
    }

    #[test]
    fn bar_chart_golden_snapshot_small() {
        let ranking = Ranking {
            metric: "Troops".to_string(),
            year: Some(2020),
            unit: "personnel".to_string(),
            entries: vec![
                RankedEntry { country: "Fiji".to_string(), value: 250.0 },
                RankedEntry { country: "Nepal".to_string(), value: 1000.0 },
            ],
        };
        let txt = render_bar_chart(&ranking, 20);
        let expected = concat!(
            "Troops (2020, personnel)\n",
            "Nepal |#################### 1000\n",
            "Fiji  |##### 250\n",
        );
        assert_eq!(txt, expected);
    }
}
