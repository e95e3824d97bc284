//! Lenient counterparts of the strict result shapes.
//!
//! These accept partially populated documents (hand-written fixtures, truncated
//! output, older runners) and defer the decision about missing fields to
//! [`BenchmarkResultJson::into_strict`].

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::relax::{require, FieldPath, Relax};
use crate::schema::{BenchmarkResult, BenchmarkRun};
use crate::stats;
use crate::MissingFieldPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkRunJson {
    #[serde(alias = "time", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkResultJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<BenchmarkRunJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_runs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<u32>,

    #[serde(alias = "total_time", skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(alias = "min_time", skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(alias = "avg_time", skip_serializing_if = "Option::is_none")]
    pub avg_value: Option<f64>,
    #[serde(alias = "mean_time", skip_serializing_if = "Option::is_none")]
    pub mean_value: Option<f64>,
    #[serde(alias = "max_time", skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl Relax for BenchmarkRun {
    type Lenient = BenchmarkRunJson;

    fn relax(self) -> Self::Lenient {
        BenchmarkRunJson {
            value: Some(self.value.relax()),
            hash: Some(self.hash.relax()),
        }
    }

    fn tighten(lenient: Self::Lenient, at: &FieldPath) -> Result<Self, SchemaError> {
        Ok(BenchmarkRun {
            value: require(lenient.value, at.field("value"))?,
            hash: require(lenient.hash, at.field("hash"))?,
        })
    }
}

impl Relax for BenchmarkResult {
    type Lenient = BenchmarkResultJson;

    fn relax(self) -> Self::Lenient {
        BenchmarkResultJson {
            runs: Some(self.runs.relax()),
            implementation: Some(self.implementation.relax()),
            value_unit: self.value_unit,
            correct: Some(self.correct.relax()),
            num_runs: Some(self.num_runs.relax()),
            num_threads: Some(self.num_threads.relax()),
            total_value: Some(self.total_value.relax()),
            min_value: Some(self.min_value.relax()),
            avg_value: Some(self.avg_value.relax()),
            mean_value: Some(self.mean_value.relax()),
            max_value: Some(self.max_value.relax()),
        }
    }

    fn tighten(lenient: Self::Lenient, at: &FieldPath) -> Result<Self, SchemaError> {
        Ok(BenchmarkResult {
            runs: require(lenient.runs, at.field("runs"))?,
            implementation: require(lenient.implementation, at.field("implementation"))?,
            value_unit: lenient.value_unit,
            correct: require(lenient.correct, at.field("correct"))?,
            num_runs: require(lenient.num_runs, at.field("num_runs"))?,
            num_threads: require(lenient.num_threads, at.field("num_threads"))?,
            total_value: require(lenient.total_value, at.field("total_value"))?,
            min_value: require(lenient.min_value, at.field("min_value"))?,
            avg_value: require(lenient.avg_value, at.field("avg_value"))?,
            mean_value: require(lenient.mean_value, at.field("mean_value"))?,
            max_value: require(lenient.max_value, at.field("max_value"))?,
        })
    }
}

impl From<BenchmarkResult> for BenchmarkResultJson {
    fn from(result: BenchmarkResult) -> Self {
        result.relax()
    }
}

impl TryFrom<BenchmarkResultJson> for BenchmarkResult {
    type Error = SchemaError;

    fn try_from(lenient: BenchmarkResultJson) -> Result<Self, Self::Error> {
        BenchmarkResult::tighten(lenient, &FieldPath::root())
    }
}

impl BenchmarkRunJson {
    fn missing_fields(&self, at: &FieldPath, out: &mut Vec<String>) {
        if self.value.is_none() {
            out.push(at.field("value").to_string());
        }
        if self.hash.is_none() {
            out.push(at.field("hash").to_string());
        }
    }
}

impl BenchmarkResultJson {
    /// Every required field that is absent, in declaration order.
    pub fn missing_fields(&self) -> Vec<String> {
        self.missing_fields_at(&FieldPath::root())
    }

    pub fn missing_fields_at(&self, at: &FieldPath) -> Vec<String> {
        let mut out = Vec::new();

        match &self.runs {
            Some(runs) => {
                let runs_at = at.field("runs");
                for (i, run) in runs.iter().enumerate() {
                    run.missing_fields(&runs_at.index(i), &mut out);
                }
            }
            None => out.push(at.field("runs").to_string()),
        }

        let scalars = [
            ("implementation", self.implementation.is_none()),
            ("correct", self.correct.is_none()),
            ("num_runs", self.num_runs.is_none()),
            ("num_threads", self.num_threads.is_none()),
            ("total_value", self.total_value.is_none()),
            ("min_value", self.min_value.is_none()),
            ("avg_value", self.avg_value.is_none()),
            ("mean_value", self.mean_value.is_none()),
            ("max_value", self.max_value.is_none()),
        ];
        out.extend(
            scalars
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| at.field(name).to_string()),
        );

        out
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fill absent fields that can be computed from `runs`. Present fields are never touched.
    ///
    /// `num_runs` needs only the run list. The statistics need every run value,
    /// `correct` needs every run hash, and neither is derived from an empty list.
    pub fn derive_missing(&mut self) {
        let Some(runs) = &self.runs else {
            return;
        };

        if self.num_runs.is_none() {
            self.num_runs = u32::try_from(runs.len()).ok();
        }

        let values: Option<Vec<f64>> = runs.iter().map(|r| r.value).collect();
        if let Some(summary) = values.as_deref().and_then(stats::summarize_values) {
            self.total_value.get_or_insert(summary.total);
            self.min_value.get_or_insert(summary.min);
            self.avg_value.get_or_insert(summary.avg);
            self.mean_value.get_or_insert(summary.mean);
            self.max_value.get_or_insert(summary.max);
        }

        let hashes: Option<Vec<u64>> = runs.iter().map(|r| r.hash).collect();
        if let Some(hashes) = hashes.filter(|h| !h.is_empty()) {
            self.correct
                .get_or_insert_with(|| hashes.iter().all(|&h| h == hashes[0]));
        }
    }

    /// Convert into the strict shape under the given missing-field policy.
    pub fn into_strict(self, policy: MissingFieldPolicy) -> Result<BenchmarkResult, SchemaError> {
        self.into_strict_at(policy, &FieldPath::root())
    }

    pub fn into_strict_at(
        mut self,
        policy: MissingFieldPolicy,
        at: &FieldPath,
    ) -> Result<BenchmarkResult, SchemaError> {
        if policy == MissingFieldPolicy::Derive {
            self.derive_missing();
        }
        BenchmarkResult::tighten(self, at)
    }
}
