use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::arena::Arena;
use crate::mutator;
use crate::pairing;
use crate::rng::Xorshift64;
use crate::runlog::RunLog;
use crate::stats::{self, StatsRow};
use crate::workers::WorkerPool;

/// Configuration errors are reported to stderr and terminate the process
/// before any arena work begins.
#[derive(Debug)]
pub enum ConfigError {
    InvalidMutationRate(f64),
    RunlogOpen { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMutationRate(r) => {
                write!(f, "--mutation must be in [0,1], got {r}")
            }
            ConfigError::RunlogOpen { path, source } => {
                write!(f, "could not open --runlog path {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Resolved simulation configuration — one-to-one with the CLI flags in
/// spec.md §6, with `threads` and `seed` already resolved to concrete,
/// nonzero values.
pub struct Config {
    pub epochs: u64,
    pub threads: usize,
    pub seed: u64,
    pub stats_interval: u64,
    pub mutation_rate: f64,
    pub runlog: Option<PathBuf>,
}

/// A cap on auto-detected thread count — the spec leaves the cap itself
/// unspecified ("capped"); this keeps a pathological `available_parallelism`
/// report from oversubscribing a population of only 2^17 pairs-of-two.
const AUTO_THREAD_CAP: usize = 256;

/// Resolve `--threads <= 0` to the number of online CPUs, capped.
pub fn resolve_threads(requested: i64) -> usize {
    if requested > 0 {
        return requested as usize;
    }
    std::thread::available_parallelism()
        .map(|n| n.get().min(AUTO_THREAD_CAP))
        .unwrap_or(1)
}

/// Resolve `--seed 0` to a process-derived, guaranteed-nonzero fallback.
/// The exact mixing function is left to implementers (spec.md §9 open
/// question (b)); this one folds the current time and the address of a
/// stack local, which varies across processes without needing any extra
/// dependency.
pub fn resolve_seed(requested: u64) -> u64 {
    if requested != 0 {
        return requested;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let local = 0u8;
    let addr = &local as *const u8 as u64;
    let mixed = nanos ^ addr.rotate_left(17) ^ std::process::id() as u64;
    if mixed == 0 { 0x9E37_79B9_7F4A_7C15 } else { mixed }
}

/// Print the one-line stderr configuration summary and effective seed
/// required by spec.md §6.
fn print_config_summary(config: &Config) {
    eprintln!(
        "complife: epochs={} threads={} stats_interval={} mutation_rate={} runlog={} seed={}",
        config.epochs,
        config.threads,
        config.stats_interval,
        config.mutation_rate,
        config
            .runlog
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string()),
        config.seed,
    );
}

fn print_stats_header() {
    println!(
        "epoch\tmean_ops\tmedian_ops\tmean_steps\tmax_steps\tunique_ids\tmodal_id\trepresentative_tape"
    );
}

fn print_stats_row(row: &StatsRow) {
    println!(
        "{}\t{:.4}\t{:.4}\t{:.4}\t{}\t{}\t{}\t|{}| ({})",
        row.epoch,
        row.mean_ops,
        row.median_ops,
        row.mean_steps,
        row.max_steps,
        row.unique_ids,
        row.modal_id,
        row.representative_tape,
        row.modal_count,
    );
}

/// Run the full simulation: validate configuration, seed the RNG,
/// initialize the arena, spin up the worker pool, and drive epochs until
/// `config.epochs` is reached, emitting a stats row every `stats_interval`
/// epochs (plus an epoch-0 row before any epoch runs).
pub fn run(config: Config) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.mutation_rate) {
        return Err(ConfigError::InvalidMutationRate(config.mutation_rate));
    }

    let mut runlog = match &config.runlog {
        Some(path) => Some(RunLog::create(path).map_err(|source| ConfigError::RunlogOpen {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    print_config_summary(&config);

    let mut rng = Xorshift64::new(config.seed);
    rng.warm(32);

    let mut arena = Arena::new(&mut rng);
    let half_population = arena.population() / 2;
    let mut pair_steps = vec![0u32; half_population];

    let pool = WorkerPool::spawn(
        config.threads,
        &mut arena.halves,
        &arena.perm,
        &mut pair_steps,
    );

    print_stats_header();
    print_stats_row(&stats::compute(0, &arena.halves, &pair_steps));

    for epoch in 1..=config.epochs {
        pairing::shuffle(&mut arena.perm, &mut rng);
        pool.run_epoch(&mut rng);
        mutator::mutate(&mut arena, epoch as u16, config.mutation_rate, &mut rng);

        if let Some(log) = runlog.as_mut() {
            // A log write failure mid-run is not a configuration error by
            // spec.md §7 (only the initial open is); degrade by dropping
            // the log rather than aborting an otherwise-healthy run.
            let _ = log.append(&pair_steps);
        }

        if epoch % config.stats_interval == 0 {
            print_stats_row(&stats::compute(epoch, &arena.halves, &pair_steps));
        }
    }

    pool.shutdown();
    if let Some(log) = runlog.take() {
        let _ = log.close();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_threads_uses_explicit_positive_value() {
        assert_eq!(resolve_threads(5), 5);
    }

    #[test]
    fn resolve_threads_falls_back_when_nonpositive() {
        assert!(resolve_threads(0) >= 1);
        assert!(resolve_threads(-3) >= 1);
    }

    #[test]
    fn resolve_seed_passes_through_nonzero() {
        assert_eq!(resolve_seed(42), 42);
    }

    #[test]
    fn resolve_seed_fallback_is_nonzero() {
        assert_ne!(resolve_seed(0), 0);
    }

    #[test]
    fn invalid_mutation_rate_is_rejected_before_any_arena_work() {
        let config = Config {
            epochs: 1,
            threads: 1,
            seed: 1,
            stats_interval: 1,
            mutation_rate: 1.5,
            runlog: None,
        };
        let err = run(config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMutationRate(_)));
    }

    #[test]
    fn unopenable_runlog_path_is_rejected_before_any_arena_work() {
        let config = Config {
            epochs: 1,
            threads: 1,
            seed: 1,
            stats_interval: 1,
            mutation_rate: 0.0,
            runlog: Some(PathBuf::from("/nonexistent-directory-for-complife/log.bin")),
        };
        let err = run(config).unwrap_err();
        assert!(matches!(err, ConfigError::RunlogOpen { .. }));
    }
}
