//! Hyperparameters and run settings
//!
//! This module defines the per-run hyperparameters handed to a policy and the
//! settings that control how a configuration is evaluated (repetitions,
//! horizon, smoothing), with validation and builder pattern methods.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{error::HarnessError, policy::PolicyOptions};

/// Hyperparameters for one policy configuration
///
/// Immutable per run: each repetition constructs its policy from the same
/// values. The discount is an experiment constant and is never swept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterConfig {
    /// Step size of value updates
    pub learning_rate: f64,

    /// Discount factor (gamma), in (0, 1]
    pub discount: f64,

    /// Epsilon of the epsilon-greedy behavior policy, in [0, 1]
    pub exploration_rate: f64,

    /// Simulated model updates per real environment step
    pub planning_budget: usize,
}

impl Default for HyperparameterConfig {
    fn default() -> Self {
        Self { learning_rate: 0.5, discount: 0.99, exploration_rate: 0.05, planning_budget: 5 }
    }
}

impl HyperparameterConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(HarnessError::invalid("learning_rate", "must be positive").into());
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(HarnessError::invalid("discount", "must be in (0, 1]").into());
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(HarnessError::invalid("exploration_rate", "must be in [0, 1]").into());
        }
        Ok(())
    }

    /// Set learning rate
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set discount factor
    pub fn discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Set exploration rate
    pub fn exploration_rate(mut self, exploration_rate: f64) -> Self {
        self.exploration_rate = exploration_rate;
        self
    }

    /// Set planning budget
    pub fn planning_budget(mut self, planning_budget: usize) -> Self {
        self.planning_budget = planning_budget;
        self
    }
}

/// How one configuration is evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Independent trials averaged into one curve
    pub n_repetitions: usize,

    /// Environment steps per trial (and length of every curve)
    pub n_timesteps: usize,

    /// Width of the moving-average window; odd and at most `n_timesteps`
    pub smoothing_window: usize,

    /// Base seed for the repetitions (`None` draws one per run)
    pub seed: Option<u64>,

    /// Policy-specific construction options
    pub policy_options: PolicyOptions,

    /// Abort a trial that runs longer than this
    pub trial_timeout: Option<Duration>,

    /// Run repetitions on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            n_repetitions: 10,
            n_timesteps: 10_000,
            smoothing_window: 101,
            seed: None,
            policy_options: PolicyOptions::default(),
            trial_timeout: None,
            parallel: false,
        }
    }
}

impl RunSettings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.n_repetitions == 0 {
            return Err(HarnessError::invalid("n_repetitions", "must be at least 1").into());
        }
        if self.n_timesteps == 0 {
            return Err(HarnessError::invalid("n_timesteps", "must be at least 1").into());
        }
        if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
            return Err(HarnessError::invalid(
                "smoothing_window",
                format!("must be odd, got {}", self.smoothing_window),
            )
            .into());
        }
        if self.smoothing_window > self.n_timesteps {
            return Err(HarnessError::invalid(
                "smoothing_window",
                format!("{} exceeds n_timesteps {}", self.smoothing_window, self.n_timesteps),
            )
            .into());
        }
        if let Some(capacity) = self.policy_options.queue_capacity
            && capacity == 0
        {
            return Err(HarnessError::invalid("queue_capacity", "must be positive when set").into());
        }
        if self.policy_options.priority_threshold < 0.0 {
            return Err(HarnessError::invalid("priority_threshold", "must be non-negative").into());
        }
        if self.trial_timeout.is_some_and(|limit| limit.is_zero()) {
            return Err(HarnessError::invalid("trial_timeout", "must be positive when set").into());
        }
        Ok(())
    }

    /// Set number of repetitions
    pub fn n_repetitions(mut self, n_repetitions: usize) -> Self {
        self.n_repetitions = n_repetitions;
        self
    }

    /// Set trial horizon
    pub fn n_timesteps(mut self, n_timesteps: usize) -> Self {
        self.n_timesteps = n_timesteps;
        self
    }

    /// Set smoothing window
    pub fn smoothing_window(mut self, smoothing_window: usize) -> Self {
        self.smoothing_window = smoothing_window;
        self
    }

    /// Set base seed
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set policy-specific options
    pub fn policy_options(mut self, policy_options: PolicyOptions) -> Self {
        self.policy_options = policy_options;
        self
    }

    /// Set per-trial wall-clock limit
    pub fn trial_timeout(mut self, trial_timeout: Option<Duration>) -> Self {
        self.trial_timeout = trial_timeout;
        self
    }

    /// Enable or disable parallel repetitions
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::harness_error;

    #[test]
    fn test_default_hyperparameters_are_valid() {
        assert!(HyperparameterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_hyperparameter_ranges() {
        let base = HyperparameterConfig::new();
        assert!(base.learning_rate(0.0).validate().is_err());
        assert!(base.discount(0.0).validate().is_err());
        assert!(base.discount(1.0).validate().is_ok());
        assert!(base.exploration_rate(1.5).validate().is_err());
        assert!(base.exploration_rate(0.0).validate().is_ok());
    }

    #[test]
    fn test_smoothing_window_must_be_odd_and_fit() {
        let settings = RunSettings::new().n_timesteps(100);
        assert!(settings.clone().smoothing_window(101).validate().is_err());
        assert!(settings.clone().smoothing_window(50).validate().is_err());
        assert!(settings.clone().smoothing_window(99).validate().is_ok());

        let err = settings.smoothing_window(4).validate().unwrap_err();
        assert!(harness_error(&err).is_some_and(HarnessError::is_configuration));
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        assert!(RunSettings::new().n_repetitions(0).validate().is_err());
    }

    #[test]
    fn test_zero_trial_timeout_rejected() {
        let settings = RunSettings::new();
        assert!(settings.clone().trial_timeout(Some(Duration::ZERO)).validate().is_err());
        assert!(settings.trial_timeout(Some(Duration::from_millis(1))).validate().is_ok());
    }
}
