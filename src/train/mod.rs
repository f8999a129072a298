//! Repeated-trial evaluation
//!
//! This module turns noisy single-trial reward traces into stable learning
//! curves: the trial executor, the repetition runner, and the curve
//! statistics they share.

pub mod config;
pub mod curve;
pub mod repetition;
pub mod trial;

pub use config::{HyperparameterConfig, RunSettings};
pub use curve::{LearningCurve, RewardTrace, average_traces, smooth};
pub use repetition::RepetitionRunner;
pub use trial::{TrialOptions, run_trial, run_trial_with};
