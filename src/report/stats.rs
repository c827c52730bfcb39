//! Summary statistics for one price series.

use serde::Serialize;

use crate::domain::SeriesResult;

/// Below this magnitude the first value is treated as zero and percent change is undefined.
pub const CHANGE_PCT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Last numeric observation in the window.
    pub current: f64,
    /// First numeric observation in the window.
    pub first: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// `current - first`.
    pub change: f64,
    /// `change / first * 100`; `None` when `first` is (nearly) zero.
    pub change_pct: Option<f64>,
    /// Number of numeric observations used.
    pub observations: usize,
}

impl SeriesStats {
    pub fn from_result(result: &SeriesResult) -> Option<Self> {
        calculate_statistics(result.values())
    }
}

/// Compute statistics over a series, skipping `NaN` observations.
///
/// Returns `None` when no numeric observation is present.
pub fn calculate_statistics<I>(values: I) -> Option<SeriesStats>
where
    I: IntoIterator<Item = f64>,
{
    let mut first = None;
    let mut current = f64::NAN;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut n = 0usize;

    for v in values.into_iter().filter(|v| !v.is_nan()) {
        first.get_or_insert(v);
        current = v;
        min = min.min(v);
        max = max.max(v);
        sum += v;
        n += 1;
    }

    let first = first?;
    let change = current - first;
    let change_pct = if first.abs() < CHANGE_PCT_EPSILON {
        None
    } else {
        Some(change / first * 100.0)
    };

    Some(SeriesStats {
        current,
        first,
        min,
        max,
        mean: sum / n as f64,
        change,
        change_pct,
        observations: n,
    })
}
