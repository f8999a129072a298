//! Hyperparameter sweeps, selection and comparisons
//!
//! This module builds on the repetition runner to answer "which value of this
//! hyperparameter works best for this policy?":
//!
//! - One-axis grid sweeps with every other hyperparameter held at its default
//! - Stable best-value selection over a sweep's curves
//! - Side-by-side comparisons of selected configurations and of planning
//!   against no planning
//! - A [`Study`] that runs all of the above from an [`ExperimentConfig`]
//!
//! # Example
//!
//! ```rust,no_run
//! use mbrl_harness::{
//!     env::WindyGridworld,
//!     optimize::*,
//!     policy::PolicyIdentity,
//!     train::{HyperparameterConfig, RepetitionRunner, RunSettings},
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let runner = RepetitionRunner::new(RunSettings::new().seed(Some(7)))?;
//! let grid = AxisGrid::exploration_rate(&[0.01, 0.05, 0.1, 0.25]);
//!
//! let sweep = run_sweep(
//!     &runner,
//!     PolicyIdentity::Dyna,
//!     &HyperparameterConfig::default(),
//!     &grid,
//!     &|seed| Ok(WindyGridworld::new(seed)),
//! )?;
//! let best = select_best(&sweep, SelectionBasis::Smoothed)?;
//! println!("best exploration rate: {}", best.value);
//! # Ok(())
//! # }
//! ```
//!
//! [`ExperimentConfig`]: crate::config::ExperimentConfig

pub mod comparison;
pub mod selector;
pub mod space;
pub mod study;
pub mod sweep;

pub use comparison::{
    ComparedCurve, ComparisonEntry, ComparisonPlan, ComparisonResult, PlanningVariant, run_comparison,
};
pub use selector::{SelectionBasis, SelectionOutcome, Selections, argmax, select_best};
pub use space::{Axis, AxisGrid, ParameterValue};
pub use study::{Study, StudyFailure, StudyReport};
pub use sweep::{SweepEntry, SweepResult, run_sweep};
