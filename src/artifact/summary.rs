//! Serializable run summaries

use serde::{Deserialize, Serialize};

use crate::train::{HyperparameterConfig, LearningCurve};

/// One curve of a sweep or comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSummary {
    /// Legend label
    pub label: String,
    /// Policy name
    pub policy: String,
    /// Configuration the curve was produced with
    pub hyperparameters: HyperparameterConfig,
    /// Mean of the smoothed curve
    pub mean: f64,
    /// Mean of the unsmoothed average
    pub raw_mean: f64,
    /// Last smoothed value
    pub final_value: f64,
    /// Wall-clock seconds spent producing the curve
    pub elapsed_secs: f64,
    /// Tabular export of the curve, if one was written
    pub csv: Option<String>,
}

impl CurveSummary {
    /// Summarize a finished curve
    pub fn new(
        label: impl Into<String>,
        policy: impl Into<String>,
        hyperparameters: HyperparameterConfig,
        curve: &LearningCurve,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            label: label.into(),
            policy: policy.into(),
            hyperparameters,
            mean: curve.mean(),
            raw_mean: curve.raw_mean(),
            final_value: curve.values().last().copied().unwrap_or(f64::NAN),
            elapsed_secs,
            csv: None,
        }
    }

    /// Record the tabular artifact name
    pub fn with_csv(mut self, name: impl Into<String>) -> Self {
        self.csv = Some(name.into());
        self
    }
}

/// Everything shown on one plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSummary {
    /// Plot title
    pub title: String,
    /// Plot artifact name
    pub plot: String,
    /// Environment steps per trial
    pub n_timesteps: usize,
    /// Trials per curve
    pub n_repetitions: usize,
    /// Smoothing window
    pub smoothing_window: usize,
    /// Curves in legend order
    pub curves: Vec<CurveSummary>,
    /// Total wall-clock seconds
    pub elapsed_secs: f64,
}
