//! Experiment configuration
//!
//! One JSON document describes a whole study: the evaluation constants, the
//! default hyperparameters, the value grid of every axis and which sweeps and
//! comparisons to run. A missing file is created with the defaults so it can
//! be edited for the next run.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::HarnessError,
    optimize::{Axis, AxisGrid, SelectionBasis},
    policy::{PolicyIdentity, PolicyOptions},
    train::{HyperparameterConfig, RunSettings},
};

/// Which parts of a study run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentToggles {
    /// Sweep the exploration rate
    pub exploration_rate: bool,
    /// Sweep the planning budget
    pub planning_budget: bool,
    /// Sweep the learning rate
    pub learning_rate: bool,
    /// Compare the selected configurations of all policies
    pub compare_selected: bool,
    /// Compare no planning against full planning per policy
    pub compare_planning: bool,
}

impl Default for ExperimentToggles {
    fn default() -> Self {
        Self {
            exploration_rate: true,
            planning_budget: true,
            learning_rate: true,
            compare_selected: true,
            compare_planning: true,
        }
    }
}

impl ExperimentToggles {
    /// Whether the sweep along `axis` is enabled
    pub fn sweeps(&self, axis: Axis) -> bool {
        match axis {
            Axis::ExplorationRate => self.exploration_rate,
            Axis::PlanningBudget => self.planning_budget,
            Axis::LearningRate => self.learning_rate,
        }
    }
}

/// Full description of a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Environment steps per trial
    pub n_timesteps: usize,

    /// Trials averaged into each curve
    pub n_repetitions: usize,

    /// Moving-average window (odd, at most `n_timesteps`)
    pub smoothing_window: usize,

    /// Discount factor shared by every run
    pub discount: f64,

    /// Base seed; `null` draws a fresh one per curve
    pub seed: Option<u64>,

    /// Policies to study, in order
    pub policies: Vec<PolicyIdentity>,

    /// Exploration rate used when another axis is swept
    pub exploration_rate: f64,

    /// Learning rate used when another axis is swept
    pub learning_rate: f64,

    /// Planning budget used when another axis is swept
    pub planning_budget: usize,

    /// Exploration rates to sweep
    pub exploration_rates: Vec<f64>,

    /// Learning rates to sweep
    pub learning_rates: Vec<f64>,

    /// Planning budgets to sweep
    pub planning_budgets: Vec<usize>,

    /// Planning budget of the "full planning" comparison arm
    pub full_planning_budget: usize,

    /// Curve statistic used to pick the best value
    pub selection_basis: SelectionBasis,

    /// Prioritized-sweeping queue settings
    pub policy_options: PolicyOptions,

    /// Sweeps and comparisons to run
    pub toggles: ExperimentToggles,

    /// Run repetitions in parallel (needs the `parallel` feature)
    pub parallel: bool,

    /// Abort a trial after this many seconds
    pub trial_timeout_secs: Option<f64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n_timesteps: 10_000,
            n_repetitions: 10,
            smoothing_window: 101,
            discount: 0.99,
            seed: None,
            policies: PolicyIdentity::ALL.to_vec(),
            exploration_rate: 0.05,
            learning_rate: 0.5,
            planning_budget: 5,
            exploration_rates: vec![0.01, 0.05, 0.1, 0.25],
            learning_rates: vec![0.1, 0.5, 1.0],
            planning_budgets: vec![1, 5, 15],
            full_planning_budget: 15,
            selection_basis: SelectionBasis::Smoothed,
            policy_options: PolicyOptions::default(),
            toggles: ExperimentToggles::default(),
            parallel: false,
            trial_timeout_secs: None,
        }
    }
}

impl ExperimentConfig {
    /// Small constants for smoke runs
    pub fn quick() -> Self {
        Self {
            n_timesteps: 1_000,
            n_repetitions: 2,
            smoothing_window: 31,
            seed: Some(0),
            ..Self::default()
        }
    }

    /// Hyperparameters every sweep starts from
    pub fn default_hyperparameters(&self) -> HyperparameterConfig {
        HyperparameterConfig::new()
            .learning_rate(self.learning_rate)
            .discount(self.discount)
            .exploration_rate(self.exploration_rate)
            .planning_budget(self.planning_budget)
    }

    /// Value grid of `axis`
    pub fn grid(&self, axis: Axis) -> AxisGrid {
        match axis {
            Axis::ExplorationRate => AxisGrid::exploration_rate(&self.exploration_rates),
            Axis::PlanningBudget => AxisGrid::planning_budget(&self.planning_budgets),
            Axis::LearningRate => AxisGrid::learning_rate(&self.learning_rates),
        }
    }

    /// Evaluation settings for the repetition runner
    pub fn run_settings(&self) -> Result<RunSettings> {
        let trial_timeout = self
            .trial_timeout_secs
            .map(|secs| match Duration::try_from_secs_f64(secs) {
                Ok(limit) if !limit.is_zero() => Ok(limit),
                _ => Err(HarnessError::invalid("trial_timeout_secs", format!("{} is not a positive duration", secs))),
            })
            .transpose()?;

        Ok(RunSettings::new()
            .n_repetitions(self.n_repetitions)
            .n_timesteps(self.n_timesteps)
            .smoothing_window(self.smoothing_window)
            .seed(self.seed)
            .policy_options(self.policy_options)
            .trial_timeout(trial_timeout)
            .parallel(self.parallel))
    }

    /// Check every constant before any work starts
    pub fn validate(&self) -> Result<()> {
        self.run_settings()?.validate()?;

        let defaults = self.default_hyperparameters();
        defaults.validate()?;

        if self.policies.is_empty() {
            return Err(HarnessError::invalid("policies", "at least one policy is required").into());
        }
        for axis in Axis::ALL {
            if self.toggles.sweeps(axis) {
                self.grid(axis).validate(&defaults)?;
            }
        }
        Ok(())
    }
}

/// Load a JSON configuration from disk, creating it with the provided initializer if missing
pub fn load_or_init<F>(path: &Path, initializer: F) -> Result<ExperimentConfig>
where
    F: FnOnce() -> ExperimentConfig,
{
    if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        Ok(config)
    } else {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let config = initializer();
        let serialized = serde_json::to_string_pretty(&config)?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::harness_error;

    #[test]
    fn test_defaults_match_reference_experiment() {
        let config = ExperimentConfig::default();
        assert!(config.validate().is_ok());

        let hyper = config.default_hyperparameters();
        assert_eq!(hyper.exploration_rate, 0.05);
        assert_eq!(hyper.learning_rate, 0.5);
        assert_eq!(hyper.planning_budget, 5);
        assert_eq!(hyper.discount, 0.99);

        let settings = config.run_settings().unwrap();
        assert_eq!(settings.n_timesteps, 10_000);
        assert_eq!(settings.n_repetitions, 10);
        assert_eq!(settings.smoothing_window, 101);
    }

    #[test]
    fn test_quick_is_valid() {
        assert!(ExperimentConfig::quick().validate().is_ok());
    }

    #[test]
    fn test_validation_catches_bad_constants() {
        let config = ExperimentConfig { smoothing_window: 100, ..ExperimentConfig::default() };
        let err = config.validate().unwrap_err();
        assert!(harness_error(&err).is_some_and(HarnessError::is_configuration));

        let config = ExperimentConfig { learning_rates: vec![], ..ExperimentConfig::default() };
        assert!(config.validate().is_err());

        // Disabled sweeps are not checked
        let mut config = ExperimentConfig { learning_rates: vec![], ..ExperimentConfig::default() };
        config.toggles.learning_rate = false;
        assert!(config.validate().is_ok());

        for secs in [-1.0, 0.0, f64::NAN] {
            let config = ExperimentConfig { trial_timeout_secs: Some(secs), ..ExperimentConfig::default() };
            assert!(config.validate().is_err(), "timeout {} accepted", secs);
        }
        let config = ExperimentConfig { trial_timeout_secs: Some(30.0), ..ExperimentConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "n_timesteps": 500, "policies": ["Prioritized Sweeping"] }"#).unwrap();
        assert_eq!(config.n_timesteps, 500);
        assert_eq!(config.policies, vec![PolicyIdentity::PrioritizedSweeping]);
        assert_eq!(config.n_repetitions, 10);
        assert!(config.toggles.compare_planning);
    }

    #[test]
    fn test_unknown_policy_in_json_is_rejected() {
        let result = serde_json::from_str::<ExperimentConfig>(r#"{ "policies": ["Foo"] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_init_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs/experiment.json");

        let created = load_or_init(&path, ExperimentConfig::quick).unwrap();
        assert!(path.exists());

        let loaded = load_or_init(&path, ExperimentConfig::default).unwrap();
        assert_eq!(loaded, created);
    }
}
