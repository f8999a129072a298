//! Model-based RL experiment on the windy gridworld
//!
//! Sweeps exploration rate, planning budget and learning rate for Dyna and
//! prioritized sweeping, selects the best value per axis and compares the
//! results. Plots, CSV rows and JSON summaries land in the output directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin mbrl-experiment -- --config experiment.json --output results
//! cargo run --release --bin mbrl-experiment -- --quick
//! ```
//!
//! A missing config file is created with the default experiment.

use std::path::PathBuf;

use anyhow::{Result, bail};
use mbrl_harness::{
    artifact::DirectorySink,
    config::{ExperimentConfig, load_or_init},
    env::WindyGridworld,
    optimize::Study,
};

struct Args {
    config: Option<PathBuf>,
    output: PathBuf,
    quick: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { config: None, output: PathBuf::from("results"), quick: false };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => args.config = Some(PathBuf::from(path)),
                None => bail!("--config needs a path"),
            },
            "--output" => match iter.next() {
                Some(path) => args.output = PathBuf::from(path),
                None => bail!("--output needs a directory"),
            },
            "--quick" => args.quick = true,
            "--help" | "-h" => {
                println!("Usage: mbrl-experiment [--config <path>] [--output <dir>] [--quick]");
                std::process::exit(0);
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let initializer = if args.quick { ExperimentConfig::quick } else { ExperimentConfig::default };
    let config = match &args.config {
        Some(path) => load_or_init(path, initializer)?,
        None => initializer(),
    };

    tracing::info!("🚀 Model-based RL experiment");
    tracing::info!(
        "  {} steps x {} repetitions, smoothing window {}",
        config.n_timesteps,
        config.n_repetitions,
        config.smoothing_window
    );
    tracing::info!(
        "  Policies: {}",
        config.policies.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    );

    let study = Study::new(config)?;
    let mut sink = DirectorySink::create(&args.output)?;
    let report = match study.run(|seed| Ok(WindyGridworld::new(seed)), &mut sink) {
        Ok(report) => report,
        Err(failure) => {
            tracing::warn!(
                "⚠️  {} plots were saved to {} before the failure",
                failure.report.summaries.len(),
                sink.root().display()
            );
            return Err(failure.into());
        }
    };

    tracing::info!("✅ Done; artifacts in {}", sink.root().display());
    for outcome in report.selections.iter() {
        tracing::info!(
            "  {} best {} = {} (score {:.4})",
            outcome.policy,
            outcome.axis,
            outcome.value,
            outcome.score
        );
    }
    Ok(())
}
