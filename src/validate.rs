//! Consistency checks between a result's runs and its declared fields.
//!
//! The strict shape only guarantees that fields exist. These checks confirm
//! that `num_runs`, `correct` and the summary statistics agree with `runs`.

use std::fmt;

use serde::Serialize;

use crate::error::SchemaError;
use crate::lenient::BenchmarkResultJson;
use crate::relax::FieldPath;
use crate::schema::BenchmarkResult;
use crate::stats;
use crate::MissingFieldPolicy;

#[derive(Clone, Debug)]
pub struct ValidationOptions {
    /// Relative tolerance for statistic comparisons.
    pub tolerance: f64,
    /// Reject `correct: true` when run hashes disagree.
    pub check_correctness: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            check_correctness: true,
        }
    }
}

impl ValidationOptions {
    fn close(&self, declared: f64, derived: f64) -> bool {
        let scale = declared.abs().max(derived.abs()).max(1.0);
        (declared - derived).abs() <= self.tolerance * scale
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inconsistency {
    RunCountMismatch { declared: u32, actual: usize },
    StatisticMismatch {
        field: &'static str,
        declared: f64,
        derived: f64,
    },
    CorrectnessMismatch,
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::RunCountMismatch { declared, actual } => {
                write!(f, "num_runs is {declared} but {actual} runs are recorded")
            }
            Inconsistency::StatisticMismatch {
                field,
                declared,
                derived,
            } => write!(f, "{field} is {declared} but runs give {derived}"),
            Inconsistency::CorrectnessMismatch => {
                write!(f, "marked correct but run hashes disagree")
            }
        }
    }
}

/// List every inconsistency in `result`. Summary-only results (no runs) are not checked.
pub fn check(result: &BenchmarkResult, opts: &ValidationOptions) -> Vec<Inconsistency> {
    let mut out = Vec::new();
    let Some(derived) = result.derived_summary() else {
        return out;
    };

    if result.num_runs as usize != result.runs.len() {
        out.push(Inconsistency::RunCountMismatch {
            declared: result.num_runs,
            actual: result.runs.len(),
        });
    }

    let integral = result.runs.iter().all(|r| r.value.fract() == 0.0);
    let middle = stats::middle_run_value(&result.runs);
    let declared = result.declared_summary();

    let total_ok = opts.close(declared.total, derived.total);
    let min_ok = opts.close(declared.min, derived.min);
    let max_ok = opts.close(declared.max, derived.max);
    // Older runners divided integer totals, truncating the average.
    let avg_ok = opts.close(declared.avg, derived.avg)
        || (integral && opts.close(declared.avg, derived.avg.trunc()));
    // Older runners stored the middle run's value rather than a sorted median.
    let mean_ok = opts.close(declared.mean, derived.mean)
        || middle.is_some_and(|m| opts.close(declared.mean, m));

    let fields = [
        ("total_value", total_ok, declared.total, derived.total),
        ("min_value", min_ok, declared.min, derived.min),
        ("avg_value", avg_ok, declared.avg, derived.avg),
        ("mean_value", mean_ok, declared.mean, derived.mean),
        ("max_value", max_ok, declared.max, derived.max),
    ];
    for (field, ok, declared, derived) in fields {
        if !ok {
            out.push(Inconsistency::StatisticMismatch {
                field,
                declared,
                derived,
            });
        }
    }

    if opts.check_correctness && result.correct && !stats::hashes_agree(&result.runs) {
        out.push(Inconsistency::CorrectnessMismatch);
    }

    out
}

pub fn validate(result: &BenchmarkResult, opts: &ValidationOptions) -> Result<(), SchemaError> {
    let problems = check(result, opts);
    if problems.is_empty() {
        return Ok(());
    }
    Err(SchemaError::Inconsistent {
        implementation: result.implementation.clone(),
        problems: problems.iter().map(ToString::to_string).collect(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Valid,
    Incomplete,
    Inconsistent,
}

/// Outcome of checking one result inside a document.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentReport {
    pub index: usize,
    pub implementation: Option<String>,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<String>,
}

impl DocumentReport {
    pub fn is_valid(&self) -> bool {
        self.status == DocumentStatus::Valid
    }
}

/// Outcome of checking one file, which holds one result or an array of them.
#[derive(Clone, Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub documents: Vec<DocumentReport>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.documents.iter().all(DocumentReport::is_valid)
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CheckReport {
    pub files: Vec<FileReport>,
    pub valid: usize,
    pub invalid: usize,
}

impl CheckReport {
    pub fn push(&mut self, file: FileReport) {
        if file.is_valid() {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
        self.files.push(file);
    }

    pub fn all_valid(&self) -> bool {
        self.invalid == 0
    }
}

/// Check one lenient result: completeness under `policy`, then consistency.
pub fn check_document(
    index: usize,
    mut lenient: BenchmarkResultJson,
    policy: MissingFieldPolicy,
    opts: &ValidationOptions,
) -> DocumentReport {
    if policy == MissingFieldPolicy::Derive {
        lenient.derive_missing();
    }
    let implementation = lenient.implementation.clone();

    let missing = lenient.missing_fields_at(&FieldPath::root());
    if !missing.is_empty() {
        tracing::debug!(index, missing = missing.len(), "result is incomplete");
        return DocumentReport {
            index,
            implementation,
            status: DocumentStatus::Incomplete,
            missing,
            problems: Vec::new(),
        };
    }

    let problems = match lenient.into_strict(MissingFieldPolicy::Reject) {
        Ok(result) => check(&result, opts).iter().map(ToString::to_string).collect(),
        Err(e) => vec![e.to_string()],
    };

    let status = if problems.is_empty() {
        DocumentStatus::Valid
    } else {
        DocumentStatus::Inconsistent
    };

    DocumentReport {
        index,
        implementation,
        status,
        missing: Vec::new(),
        problems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BenchmarkRun;
    use serde_json::json;

    fn result(values: &[(f64, u64)]) -> BenchmarkResult {
        let runs = values.iter().map(|&(v, h)| BenchmarkRun::new(v, h)).collect();
        BenchmarkResult::from_runs("libcuckoo", 16, runs).unwrap()
    }

    #[test]
    fn test_derived_result_is_consistent() {
        let r = result(&[(12.0, 3), (9.0, 3), (15.0, 3), (10.0, 3)]);
        assert!(check(&r, &ValidationOptions::default()).is_empty());
        assert!(validate(&r, &ValidationOptions::default()).is_ok());
    }

    #[test]
    fn test_two_run_median_passes() {
        let r: BenchmarkResult = serde_json::from_value(json!({
            "runs": [{"value": 1, "hash": 5}, {"value": 2, "hash": 5}],
            "implementation": "impl-a",
            "correct": true,
            "num_runs": 2,
            "num_threads": 1,
            "total_value": 3,
            "min_value": 1,
            "avg_value": 1.5,
            "mean_value": 1.5,
            "max_value": 2
        }))
        .unwrap();
        assert_eq!(check(&r, &ValidationOptions::default()), Vec::new());
    }

    #[test]
    fn test_run_count_mismatch() {
        let mut r = result(&[(1.0, 1), (2.0, 1)]);
        r.num_runs = 10;
        assert_eq!(
            check(&r, &ValidationOptions::default()),
            vec![Inconsistency::RunCountMismatch {
                declared: 10,
                actual: 2
            }]
        );
    }

    #[test]
    fn test_statistic_mismatch_names_field() {
        let mut r = result(&[(1.0, 1), (2.0, 1)]);
        r.max_value = 5.0;
        let problems = check(&r, &ValidationOptions::default());
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].to_string(), "max_value is 5 but runs give 2");
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let mut r = result(&[(0.1, 1), (0.2, 1)]);
        r.total_value = 0.3;
        assert!(check(&r, &ValidationOptions::default()).is_empty());

        r.total_value = 0.31;
        let strict = ValidationOptions {
            tolerance: 1e-3,
            ..Default::default()
        };
        assert_eq!(check(&r, &strict).len(), 1);
        let loose = ValidationOptions {
            tolerance: 0.1,
            ..Default::default()
        };
        assert!(check(&r, &loose).is_empty());
    }

    #[test]
    fn test_accepts_truncated_integer_average() {
        let mut r = result(&[(3.0, 1), (4.0, 1)]);
        r.avg_value = 3.0;
        assert!(check(&r, &ValidationOptions::default()).is_empty());

        r.avg_value = 2.0;
        assert_eq!(check(&r, &ValidationOptions::default()).len(), 1);
    }

    #[test]
    fn test_truncated_average_rounds_toward_zero() {
        let mut r = result(&[(-3.0, 1), (-4.0, 1)]);
        r.avg_value = -3.0;
        assert!(check(&r, &ValidationOptions::default()).is_empty());

        r.avg_value = -4.0;
        assert_eq!(check(&r, &ValidationOptions::default()).len(), 1);
    }

    #[test]
    fn test_accepts_middle_run_as_mean() {
        let mut r = result(&[(9.0, 1), (1.0, 1), (5.0, 1), (3.0, 1)]);
        // Median is 4, the run at index 2 is 5.
        assert_eq!(r.mean_value, 4.0);
        r.mean_value = 5.0;
        assert!(check(&r, &ValidationOptions::default()).is_empty());

        r.mean_value = 9.0;
        assert_eq!(check(&r, &ValidationOptions::default()).len(), 1);
    }

    #[test]
    fn test_correctness_mismatch() {
        let mut r = result(&[(1.0, 1), (1.0, 2)]);
        assert!(!r.correct);
        assert!(check(&r, &ValidationOptions::default()).is_empty());

        r.correct = true;
        assert_eq!(
            check(&r, &ValidationOptions::default()),
            vec![Inconsistency::CorrectnessMismatch]
        );

        let lax = ValidationOptions {
            check_correctness: false,
            ..Default::default()
        };
        assert!(check(&r, &lax).is_empty());
    }

    #[test]
    fn test_summary_only_result_is_not_checked() {
        let mut r = result(&[(1.0, 1)]);
        r.runs.clear();
        r.num_runs = 10;
        assert!(check(&r, &ValidationOptions::default()).is_empty());
    }

    #[test]
    fn test_validate_error_lists_problems() {
        let mut r = result(&[(1.0, 1), (2.0, 1)]);
        r.num_runs = 3;
        r.min_value = 0.0;
        let err = validate(&r, &ValidationOptions::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("inconsistent result for `libcuckoo`"));
        assert!(msg.contains("num_runs is 3 but 2 runs are recorded"));
        assert!(msg.contains("min_value is 0 but runs give 1"));
    }

    #[test]
    fn test_check_document_incomplete() {
        let lenient: BenchmarkResultJson =
            serde_json::from_value(json!({"implementation": "impl-b"})).unwrap();
        let report = check_document(0, lenient, MissingFieldPolicy::Reject, &Default::default());

        assert_eq!(report.status, DocumentStatus::Incomplete);
        assert_eq!(report.implementation.as_deref(), Some("impl-b"));
        assert!(report.missing.contains(&"runs".to_string()));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_check_document_derive_policy() {
        let lenient: BenchmarkResultJson = serde_json::from_value(json!({
            "runs": [{"value": 2.0, "hash": 1}, {"value": 4.0, "hash": 1}],
            "implementation": "tbb-unordered",
            "num_threads": 2
        }))
        .unwrap();

        let rejected = check_document(
            1,
            lenient.clone(),
            MissingFieldPolicy::Reject,
            &Default::default(),
        );
        assert_eq!(rejected.status, DocumentStatus::Incomplete);

        let derived = check_document(1, lenient, MissingFieldPolicy::Derive, &Default::default());
        assert_eq!(derived.status, DocumentStatus::Valid);
        assert_eq!(derived.index, 1);
    }

    #[test]
    fn test_check_document_inconsistent() {
        let mut r = result(&[(1.0, 1), (2.0, 1)]);
        r.total_value = 100.0;
        let report = check_document(
            0,
            r.into(),
            MissingFieldPolicy::Reject,
            &Default::default(),
        );
        assert_eq!(report.status, DocumentStatus::Inconsistent);
        assert_eq!(report.problems, vec!["total_value is 100 but runs give 3"]);
    }

    #[test]
    fn test_check_report_counts() {
        let mut report = CheckReport::default();
        report.push(FileReport {
            path: "a.json".to_string(),
            error: None,
            documents: Vec::new(),
        });
        report.push(FileReport {
            path: "b.json".to_string(),
            error: Some("JSON error".to_string()),
            documents: Vec::new(),
        });
        assert_eq!(report.valid, 1);
        assert_eq!(report.invalid, 1);
        assert!(!report.all_valid());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["files"][1]["error"], "JSON error");
        assert!(value["files"][0].get("error").is_none());
    }
}
