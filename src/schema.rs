use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::stats::{self, Summary};

/// One measured execution of an implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    /// Elapsed time in ns, or an operation count for throughput workloads.
    #[serde(alias = "time")]
    pub value: f64,
    /// Checksum of the run's output; equal hashes mean equal output.
    pub hash: u64,
}

impl BenchmarkRun {
    pub fn new(value: f64, hash: u64) -> Self {
        Self { value, hash }
    }
}

/// Aggregate outcome of benchmarking one implementation.
///
/// Every field is required except `value_unit`. Use
/// [`BenchmarkResultJson`](crate::lenient::BenchmarkResultJson) to ingest
/// documents that may be incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Runs in execution order.
    pub runs: Vec<BenchmarkRun>,
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_unit: Option<String>,
    pub correct: bool,
    pub num_runs: u32,
    pub num_threads: u32,

    #[serde(alias = "total_time")]
    pub total_value: f64,
    #[serde(alias = "min_time")]
    pub min_value: f64,
    #[serde(alias = "avg_time")]
    pub avg_value: f64,
    #[serde(alias = "mean_time")]
    pub mean_value: f64,
    #[serde(alias = "max_time")]
    pub max_value: f64,
}

impl BenchmarkResult {
    /// Build a complete result, deriving counts, correctness and statistics from `runs`.
    pub fn from_runs(
        implementation: impl Into<String>,
        num_threads: u32,
        runs: Vec<BenchmarkRun>,
    ) -> Result<Self, SchemaError> {
        let summary = stats::summarize(&runs).ok_or(SchemaError::EmptyRuns)?;
        let num_runs =
            u32::try_from(runs.len()).map_err(|_| SchemaError::TooManyRuns(runs.len()))?;
        let correct = stats::hashes_agree(&runs);

        Ok(Self {
            runs,
            implementation: implementation.into(),
            value_unit: None,
            correct,
            num_runs,
            num_threads,
            total_value: summary.total,
            min_value: summary.min,
            avg_value: summary.avg,
            mean_value: summary.mean,
            max_value: summary.max,
        })
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.value_unit = Some(unit.into());
        self
    }

    /// The declared summary statistics, as stored in the document.
    pub fn declared_summary(&self) -> Summary {
        Summary {
            total: self.total_value,
            min: self.min_value,
            avg: self.avg_value,
            mean: self.mean_value,
            max: self.max_value,
        }
    }

    /// Statistics recomputed from `runs`; `None` for a summary-only document.
    pub fn derived_summary(&self) -> Option<Summary> {
        stats::summarize(&self.runs)
    }
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = self.value_unit.as_deref().unwrap_or("");
        write!(
            f,
            "{} ({} runs, {} threads): min {}{unit} / avg {}{unit} / max {}{unit}{}",
            self.implementation,
            self.num_runs,
            self.num_threads,
            self.min_value,
            self.avg_value,
            self.max_value,
            if self.correct { "" } else { " [incorrect]" },
        )
    }
}
