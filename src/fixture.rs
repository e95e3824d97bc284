//! Deterministic synthetic result documents.
//!
//! Generates plausible results for the hashmap implementations under test, so
//! that tooling and tests have stable inputs. The same config and seed always
//! produce the same output, independent of thread count.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::SchemaError;
use crate::lenient::BenchmarkResultJson;
use crate::relax::Relax;
use crate::schema::{BenchmarkResult, BenchmarkRun};

/// Implementation names cycled through by the generator.
pub const IMPLEMENTATIONS: &[&str] = &[
    "stdmap-blocking",
    "stdmap-atomic",
    "libcuckoo",
    "tbb-hashmap",
    "tbb-unordered",
    "junction",
];

#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Number of results to generate.
    pub count: usize,
    pub runs: u32,
    pub threads: u32,
    pub seed: u64,
    /// Centre of the generated run values.
    pub base_value: f64,
    /// Relative spread of run values around `base_value`, at most 1 in magnitude.
    pub jitter: f64,
    /// Probability that a run's hash diverges from the first run's.
    pub fault_rate: f64,
    pub unit: Option<String>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            count: IMPLEMENTATIONS.len(),
            runs: 10,
            threads: 16,
            seed: 42,
            base_value: 250_000_000.0,
            jitter: 0.1,
            fault_rate: 0.0,
            unit: Some("ns".to_string()),
        }
    }
}

impl FixtureConfig {
    /// Reject parameters the random generator cannot sample from.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !self.base_value.is_finite() {
            return Err(SchemaError::InvalidParameter {
                name: "base_value",
                value: self.base_value,
                expected: "a finite number",
            });
        }
        if !(0.0..=1.0).contains(&self.jitter.abs()) {
            return Err(SchemaError::InvalidParameter {
                name: "jitter",
                value: self.jitter,
                expected: "a relative spread in [-1, 1]",
            });
        }
        check_rate("fault_rate", self.fault_rate)
    }
}

fn check_rate(name: &'static str, rate: f64) -> Result<(), SchemaError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(SchemaError::InvalidParameter {
            name,
            value: rate,
            expected: "a probability in [0, 1]",
        })
    }
}

fn per_result_seed(master_seed: u64, index: usize) -> u64 {
    master_seed
        .wrapping_add(index as u64)
        .wrapping_mul(0x517cc1b727220a95)
}

fn implementation_name(index: usize) -> String {
    let base = IMPLEMENTATIONS[index % IMPLEMENTATIONS.len()];
    match index / IMPLEMENTATIONS.len() {
        0 => base.to_string(),
        round => format!("{base}-{round}"),
    }
}

fn generate_result(config: &FixtureConfig, index: usize) -> Result<BenchmarkResult, SchemaError> {
    let mut rng = ChaCha8Rng::seed_from_u64(per_result_seed(config.seed, index));

    // Each implementation gets its own speed so results are distinguishable.
    let scale = rng.gen_range(0.5..2.0);
    let centre = config.base_value * scale;
    let spread = config.jitter.abs();
    let expected_hash: u64 = rng.gen();

    let runs = (0..config.runs)
        .map(|_| {
            let factor = if spread > 0.0 {
                rng.gen_range(1.0 - spread..1.0 + spread)
            } else {
                1.0
            };
            let hash = if rng.gen_bool(config.fault_rate) {
                rng.gen()
            } else {
                expected_hash
            };
            BenchmarkRun::new((centre * factor).round(), hash)
        })
        .collect();

    let result = BenchmarkResult::from_runs(implementation_name(index), config.threads, runs)?;
    Ok(match &config.unit {
        Some(unit) => result.with_unit(unit.clone()),
        None => result,
    })
}

/// Generate `config.count` complete, internally consistent results.
pub fn generate(config: &FixtureConfig) -> Result<Vec<BenchmarkResult>, SchemaError> {
    config.validate()?;
    (0..config.count)
        .into_par_iter()
        .map(|i| generate_result(config, i))
        .collect()
}

/// Generate results, then blank out each field with probability `drop_rate`.
///
/// `drop_rate` must lie in `[0, 1]`.
///
/// `implementation` is always kept so documents stay identifiable.
pub fn generate_partial(
    config: &FixtureConfig,
    drop_rate: f64,
) -> Result<Vec<BenchmarkResultJson>, SchemaError> {
    check_rate("drop_rate", drop_rate)?;
    let complete = generate(config)?;

    Ok(complete
        .into_iter()
        .enumerate()
        .map(|(i, result)| {
            let mut rng = ChaCha8Rng::seed_from_u64(per_result_seed(!config.seed, i));
            blank_fields(result.relax(), &mut rng, drop_rate)
        })
        .collect())
}

fn blank_fields(
    mut json: BenchmarkResultJson,
    rng: &mut ChaCha8Rng,
    drop_rate: f64,
) -> BenchmarkResultJson {
    let dropped = |rng: &mut ChaCha8Rng| rng.gen_bool(drop_rate);

    if let Some(runs) = json.runs.as_mut() {
        for run in runs.iter_mut() {
            if dropped(rng) {
                run.value = None;
            }
            if dropped(rng) {
                run.hash = None;
            }
        }
        if dropped(rng) {
            // Truncated output: keep a prefix of the runs.
            let keep = rng.gen_range(0..=runs.len());
            runs.truncate(keep);
        }
    }

    let mut order = [0usize, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    order.shuffle(rng);
    for field in order {
        if !dropped(rng) {
            continue;
        }
        match field {
            0 => json.runs = None,
            1 => json.value_unit = None,
            2 => json.correct = None,
            3 => json.num_runs = None,
            4 => json.num_threads = None,
            5 => json.total_value = None,
            6 => json.min_value = None,
            7 => json.avg_value = None,
            8 => json.mean_value = None,
            _ => json.max_value = None,
        }
    }

    json
}
