use clap::ValueEnum;

pub mod error;
pub mod fixture;
pub mod io;
pub mod lenient;
pub mod relax;
pub mod schema;
pub mod stats;
pub mod validate;

pub use error::SchemaError;
pub use lenient::{BenchmarkResultJson, BenchmarkRunJson};
pub use relax::{FieldPath, Relax};
pub use schema::{BenchmarkResult, BenchmarkRun};

/// What to do with required fields absent from a lenient document.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum MissingFieldPolicy {
    /// Fail, naming the first missing field.
    #[default]
    Reject,
    /// Compute what can be computed from the runs, then fail on anything still missing.
    Derive,
}
