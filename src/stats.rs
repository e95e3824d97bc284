//! Summary statistics over a sequence of runs.

use std::cmp::Ordering;

use crate::schema::BenchmarkRun;

/// The five summary statistics stored alongside the runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub total: f64,
    pub min: f64,
    pub avg: f64,
    /// Median of the run values.
    pub mean: f64,
    pub max: f64,
}

/// Summarize run values; `None` when there are no runs.
pub fn summarize(runs: &[BenchmarkRun]) -> Option<Summary> {
    let values: Vec<f64> = runs.iter().map(|r| r.value).collect();
    summarize_values(&values)
}

pub fn summarize_values(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        total += v;
        min = min.min(v);
        max = max.max(v);
    }

    Some(Summary {
        total,
        min,
        avg: total / values.len() as f64,
        mean: median(values),
        max,
    })
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Value of the run at index `n / 2` in execution order.
///
/// Older result files store this as `mean_value`.
pub fn middle_run_value(runs: &[BenchmarkRun]) -> Option<f64> {
    runs.get(runs.len() / 2).map(|r| r.value)
}

/// True when every run produced the same hash as the first. Vacuously true for no runs.
pub fn hashes_agree(runs: &[BenchmarkRun]) -> bool {
    match runs.first() {
        Some(first) => runs.iter().all(|r| r.hash == first.hash),
        None => true,
    }
}
