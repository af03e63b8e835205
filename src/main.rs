use std::path::PathBuf;

use clap::Parser;
use bff_soup::driver::{self, Config, ConfigError};

/// BFF primordial soup harness: a persistent population of self-modifying
/// programs, paired and interpreted epoch by epoch.
#[derive(Parser)]
#[command(name = "complife", about = "BFF primordial soup harness")]
struct Cli {
    /// Number of epochs to run.
    #[arg(long, default_value_t = 10_000)]
    epochs: u64,

    /// Worker thread count. Zero or negative auto-detects from the number
    /// of available CPUs.
    #[arg(long, default_value_t = 0)]
    threads: i64,

    /// Random seed. Zero resolves to a process-derived nonzero fallback.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Emit a stats row every N epochs (and once before epoch 1).
    #[arg(long, default_value_t = 100)]
    stats: u64,

    /// Per-cell mutation probability per epoch, in [0, 1].
    #[arg(long, default_value_t = 0.0)]
    mutation: f64,

    /// Optional path to an append-only binary run-length log.
    #[arg(long)]
    runlog: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = Config {
        epochs: cli.epochs,
        threads: driver::resolve_threads(cli.threads),
        seed: driver::resolve_seed(cli.seed),
        stats_interval: cli.stats.max(1),
        mutation_rate: cli.mutation,
        runlog: cli.runlog,
    };

    if let Err(err) = driver::run(config) {
        eprintln!("complife: {err}");
        std::process::exit(exit_code_for(&err));
    }
}

fn exit_code_for(err: &ConfigError) -> i32 {
    match err {
        ConfigError::InvalidMutationRate(_) => 2,
        ConfigError::RunlogOpen { .. } => 3,
    }
}
