use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hashmap_bench_report::fixture::{self, FixtureConfig};
use hashmap_bench_report::io;
use hashmap_bench_report::validate::{self, CheckReport, FileReport, ValidationOptions};
use hashmap_bench_report::{BenchmarkResult, FieldPath, MissingFieldPolicy};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate result documents: completeness, then consistency of statistics with runs.
    ///
    /// Writes a JSON report and exits with an error if any document fails.
    Check {
        /// Result files or directories (searched recursively for *.json).
        #[arg(value_name = "PATH", num_args = 1.., required = true)]
        paths: Vec<PathBuf>,
    },

    /// Read a lenient document and write it back in the strict, canonical form.
    ///
    /// Legacy `time` field names are rewritten to `value`.
    Normalize {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Write the result even when statistics disagree with the runs.
        #[arg(long, default_value_t = false)]
        allow_inconsistent: bool,
    },

    /// Generate deterministic synthetic results.
    Fixture(FixtureArgs),
}

#[derive(clap::Args, Debug)]
struct FixtureArgs {
    /// Number of results to generate.
    #[arg(long, short = 'n', default_value_t = 6)]
    count: usize,

    #[arg(long, default_value_t = 10)]
    runs: u32,

    #[arg(long, default_value_t = 16)]
    threads: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Relative spread of run values.
    #[arg(long, default_value_t = 0.1)]
    jitter: f64,

    /// Probability that a run reports a diverging hash.
    #[arg(long, default_value_t = 0.0)]
    fault_rate: f64,

    /// Unit of run values; an empty string omits `value_unit`.
    #[arg(long, default_value = "ns")]
    unit: String,

    /// Blank out fields with this probability, producing partial documents.
    #[arg(long, value_name = "RATE")]
    partial: Option<f64>,
}

impl FixtureArgs {
    fn config(&self) -> FixtureConfig {
        FixtureConfig {
            count: self.count,
            runs: self.runs,
            threads: self.threads,
            seed: self.seed,
            jitter: self.jitter,
            fault_rate: self.fault_rate,
            unit: Some(self.unit.clone()).filter(|u| !u.is_empty()),
            ..Default::default()
        }
    }

    /// Strict results, or lenient ones when `--partial` is given.
    fn render(&self) -> anyhow::Result<String> {
        let config = self.config();
        let json = match self.partial {
            Some(rate) => {
                let partial = fixture::generate_partial(&config, rate)?;
                serde_json::to_string_pretty(&partial)?
            }
            None => io::to_json_pretty(&fixture::generate(&config)?)?,
        };
        Ok(json)
    }
}

#[derive(Parser, Debug)]
#[command(name = "hashmap-bench-report")]
#[command(about = "Validate and normalize hashmap benchmark result documents (JSON)")]
struct Args {
    /// How to treat required fields missing from a document.
    #[arg(long, value_enum, default_value_t = MissingFieldPolicy::Reject, global = true)]
    policy: MissingFieldPolicy,

    /// Relative tolerance when comparing declared statistics with the runs.
    #[arg(long, default_value_t = 1e-9, global = true)]
    tolerance: f64,

    /// Accept `correct: true` even when run hashes disagree.
    #[arg(long, default_value_t = false, global = true)]
    skip_correctness: bool,

    /// Where to write JSON output. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(out: Option<&Path>, json: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn check_file(path: &Path, policy: MissingFieldPolicy, opts: &ValidationOptions) -> FileReport {
    let shown = path.display().to_string();
    match io::read_document(path) {
        Ok(results) => {
            let documents: Vec<_> = results
                .into_iter()
                .enumerate()
                .map(|(i, r)| validate::check_document(i, r, policy, opts))
                .collect();
            for doc in documents.iter().filter(|d| !d.is_valid()) {
                tracing::warn!(
                    path = %path.display(),
                    index = doc.index,
                    implementation = doc.implementation.as_deref().unwrap_or("?"),
                    status = ?doc.status,
                    "invalid result"
                );
            }
            FileReport {
                path: shown,
                error: None,
                documents,
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable document");
            FileReport {
                path: shown,
                error: Some(e.to_string()),
                documents: Vec::new(),
            }
        }
    }
}

fn normalize(
    input: &Path,
    policy: MissingFieldPolicy,
    opts: &ValidationOptions,
    allow_inconsistent: bool,
) -> anyhow::Result<Vec<BenchmarkResult>> {
    let lenient = io::read_document(input)?;
    let single = lenient.len() == 1;

    let mut results = Vec::with_capacity(lenient.len());
    for (i, doc) in lenient.into_iter().enumerate() {
        let at = if single {
            FieldPath::root()
        } else {
            FieldPath::root().index(i)
        };
        let result = doc
            .into_strict_at(policy, &at)
            .with_context(|| format!("normalizing {}", input.display()))?;

        if let Err(e) = validate::validate(&result, opts) {
            if !allow_inconsistent {
                return Err(e.into());
            }
            tracing::warn!(error = %e, "keeping inconsistent result");
        }
        results.push(result);
    }
    Ok(results)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let opts = ValidationOptions {
        tolerance: args.tolerance,
        check_correctness: !args.skip_correctness,
    };

    let json = match &args.cmd {
        Command::Check { paths } => {
            let files = io::expand_inputs(paths)?;
            tracing::info!(files = files.len(), policy = ?args.policy, "checking result documents");

            // Indexed parallel iterator; collect preserves input order.
            let reports: Vec<FileReport> = files
                .par_iter()
                .map(|path| check_file(path, args.policy, &opts))
                .collect();

            let mut report = CheckReport::default();
            for file in reports {
                report.push(file);
            }

            emit(args.out.as_deref(), &serde_json::to_string_pretty(&report)?)?;
            if !report.all_valid() {
                bail!(
                    "{} of {} files failed validation",
                    report.invalid,
                    report.valid + report.invalid
                );
            }
            return Ok(());
        }
        Command::Normalize {
            input,
            allow_inconsistent,
        } => {
            let results = normalize(input, args.policy, &opts, *allow_inconsistent)?;
            tracing::info!(results = results.len(), "normalized");
            io::to_json_pretty(&results)?
        }
        Command::Fixture(fixture_args) => {
            let json = fixture_args.render()?;
            tracing::info!(count = fixture_args.count, "generated fixtures");
            json
        }
    };

    emit(args.out.as_deref(), &json)
}
