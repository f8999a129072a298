//! # mbrl-harness
//!
//! Repeated-trial evaluation and hyperparameter sweeps for model-based RL
//!
//! A single training run of a tabular agent is noisy. This crate runs many
//! independent trials of one configuration, averages and smooths their
//! per-step rewards into a learning curve, sweeps hyperparameters one axis at
//! a time, picks the best value per axis and compares the winners.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mbrl_harness::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let runner = RepetitionRunner::new(RunSettings::new().n_repetitions(5).seed(Some(1)))?;
//! let curve = runner.run(PolicyIdentity::Dyna, &HyperparameterConfig::default(), |seed| {
//!     Ok(WindyGridworld::new(seed))
//! })?;
//! println!("mean reward per step: {:.3}", curve.mean());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Environment trait and the windy gridworld
pub mod env;

/// Policy trait, policy identities and the tabular model-based agents
pub mod policy;

/// Trial execution, repetitions and learning curves
pub mod train;

/// Sweeps, selection, comparisons and studies
pub mod optimize;

/// CSV, PNG and JSON artifacts
pub mod artifact;

/// Experiment configuration
pub mod config;

/// Harness error taxonomy
pub mod error;

/// Utility functions and helpers
pub mod utils;

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::{
        artifact::{ArtifactSink, DirectorySink, MemorySink},
        config::ExperimentConfig,
        env::{Environment, WindyGridworld},
        error::HarnessError,
        optimize::{Axis, AxisGrid, SelectionBasis, Study, run_comparison, run_sweep, select_best},
        policy::{Policy, PolicyIdentity},
        train::{HyperparameterConfig, LearningCurve, RepetitionRunner, RunSettings},
    };
}

/// Current version of mbrl-harness
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
