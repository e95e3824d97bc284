//! Error types for parsing, tightening and validating benchmark results.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for result schema operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A required field was absent in a lenient document.
    #[error("missing required field `{path}`")]
    MissingField { path: String },

    /// Summary statistics were requested for a result without runs.
    #[error("cannot summarize a benchmark without runs")]
    EmptyRuns,

    /// The run count does not fit the serialized `num_runs` field.
    #[error("too many runs for a single result: {0}")]
    TooManyRuns(usize),

    /// A generator parameter is outside its accepted range.
    #[error("invalid {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Declared fields disagree with what the runs imply.
    #[error("inconsistent result for `{implementation}`: {}", .problems.join("; "))]
    Inconsistent {
        implementation: String,
        problems: Vec<String>,
    },

    /// Malformed JSON, or a field of the wrong type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    pub fn missing(path: impl Into<String>) -> Self {
        SchemaError::MissingField { path: path.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SchemaError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error comes from the document's content rather than the environment or caller.
    pub fn is_document_error(&self) -> bool {
        !matches!(
            self,
            SchemaError::Io { .. } | SchemaError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_path() {
        let err = SchemaError::missing("runs[1].hash");
        assert_eq!(err.to_string(), "missing required field `runs[1].hash`");
        assert!(err.is_document_error());
    }

    #[test]
    fn test_inconsistent_joins_problems() {
        let err = SchemaError::Inconsistent {
            implementation: "libcuckoo".to_string(),
            problems: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "inconsistent result for `libcuckoo`: a; b");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = SchemaError::InvalidParameter {
            name: "fault_rate",
            value: f64::NAN,
            expected: "a probability in [0, 1]",
        };
        assert_eq!(
            err.to_string(),
            "invalid fault_rate: NaN (expected a probability in [0, 1])"
        );
        assert!(!err.is_document_error());
    }

    #[test]
    fn test_io_error_is_not_document_error() {
        let err = SchemaError::io(
            "results.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!err.is_document_error());
        assert!(err.to_string().contains("results.json"));
    }
}
