//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series is drawn as a line of its own marker character. A missing
//! observation breaks the line.

use chrono::{Datelike, NaiveDate};

use crate::domain::SeriesBatch;

const MARKERS: [char; 8] = ['*', '+', 'o', 'x', '#', '@', '%', '='];

/// Render every series in the batch on one shared grid.
pub fn render_series_plot(batch: &SeriesBatch, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some(bounds) = Bounds::from_batch(batch) else {
        return "No data to plot.\n".to_string();
    };

    let mut grid = vec![vec![' '; width]; height];
    let mut legend = Vec::new();

    for (i, (name, result)) in batch.iter().filter(|(_, r)| !r.is_empty()).enumerate() {
        let marker = MARKERS[i % MARKERS.len()];
        legend.push(format!("  {marker} {name}"));

        let mut prev = None;
        for p in result.points() {
            if p.is_missing() {
                prev = None;
                continue;
            }
            let x = map_x(day_number(p.date), bounds.x_min, bounds.x_max, width);
            let y = map_y(p.value, bounds.y_min, bounds.y_max, height);
            match prev {
                Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, marker),
                None => {
                    if grid[y][x] == ' ' {
                        grid[y][x] = marker;
                    }
                }
            }
            prev = Some((x, y));
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | y=[{:.2}, {:.2}]\n",
        bounds.first, bounds.last, bounds.y_min, bounds.y_max
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for line in legend {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

struct Bounds {
    first: NaiveDate,
    last: NaiveDate,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Bounds {
    fn from_batch(batch: &SeriesBatch) -> Option<Self> {
        let mut first: Option<NaiveDate> = None;
        let mut last: Option<NaiveDate> = None;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;

        for (_, result) in batch.iter() {
            for p in result.points().iter().filter(|p| !p.is_missing()) {
                first = Some(first.map_or(p.date, |d| d.min(p.date)));
                last = Some(last.map_or(p.date, |d| d.max(p.date)));
                y_min = y_min.min(p.value);
                y_max = y_max.max(p.value);
            }
        }

        let (first, last) = (first?, last?);
        let (mut x_min, mut x_max) = (day_number(first), day_number(last));
        if x_max <= x_min {
            x_min -= 1.0;
            x_max += 1.0;
        }
        let (y_min, y_max) = if y_max > y_min {
            pad_range(y_min, y_max, 0.05)
        } else {
            (y_min - 1.0, y_max + 1.0)
        };

        Some(Self {
            first,
            last,
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
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

/// Integer line drawing (Bresenham). Earlier series keep their cells.
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
