//! Reward traces and learning curves
//!
//! A [`RewardTrace`] is the raw per-step reward of one trial. A
//! [`LearningCurve`] is the across-repetition average of several traces,
//! followed by a centered moving average.
//!
//! Both averages are computed relative to a reference value (incremental mean
//! across repetitions, offset-from-center within a window) so constant inputs
//! come back bit-identical.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Per-step rewards of a single trial, in temporal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTrace(Vec<f64>);

impl RewardTrace {
    /// Wrap recorded rewards
    pub fn new(rewards: Vec<f64>) -> Self {
        Self(rewards)
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no steps were recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded rewards
    pub fn rewards(&self) -> &[f64] {
        &self.0
    }

    /// Total reward over the trial
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Averaged and smoothed reward-per-step estimate for one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    raw: Vec<f64>,
    smoothed: Vec<f64>,
    smoothing_window: usize,
    n_repetitions: usize,
}

impl LearningCurve {
    /// Average `traces` step-wise and smooth the result
    pub fn from_traces(traces: &[RewardTrace], smoothing_window: usize) -> Result<Self> {
        let raw = average_traces(traces)?;
        let smoothed = smooth(&raw, smoothing_window)?;
        Ok(Self { raw, smoothed, smoothing_window, n_repetitions: traces.len() })
    }

    /// Smoothed values (the curve that gets plotted and exported)
    pub fn values(&self) -> &[f64] {
        &self.smoothed
    }

    /// Across-repetition average before smoothing
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    /// Whether the curve is empty
    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }

    /// Window used for smoothing
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Number of traces averaged into this curve
    pub fn n_repetitions(&self) -> usize {
        self.n_repetitions
    }

    /// Mean of the smoothed curve
    pub fn mean(&self) -> f64 {
        mean(&self.smoothed)
    }

    /// Mean of the unsmoothed average
    pub fn raw_mean(&self) -> f64 {
        mean(&self.raw)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Step-wise mean across traces of equal length
pub fn average_traces(traces: &[RewardTrace]) -> Result<Vec<f64>> {
    let Some(first) = traces.first() else {
        return Err(HarnessError::invalid("n_repetitions", "cannot average zero traces").into());
    };

    let mut average = vec![0.0; first.len()];
    for (index, trace) in traces.iter().enumerate() {
        if trace.len() != average.len() {
            return Err(HarnessError::invalid(
                "n_timesteps",
                format!("trace {} has {} steps, expected {}", index, trace.len(), average.len()),
            )
            .into());
        }
        // Incremental mean: exact for a single trace and for identical traces
        let count = (index + 1) as f64;
        for (mean, &reward) in average.iter_mut().zip(trace.rewards()) {
            *mean += (reward - *mean) / count;
        }
    }
    Ok(average)
}

/// Centered moving average with an odd window
///
/// Near the edges the window shrinks symmetrically to the largest radius that
/// fits, so the first and last values are returned unchanged.
pub fn smooth(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 || window % 2 == 0 {
        return Err(
            HarnessError::invalid("smoothing_window", format!("must be odd, got {}", window)).into()
        );
    }
    if window > values.len() {
        return Err(HarnessError::invalid(
            "smoothing_window",
            format!("{} exceeds curve length {}", window, values.len()),
        )
        .into());
    }

    let half = window / 2;
    let last = values.len() - 1;
    let smoothed = values
        .iter()
        .enumerate()
        .map(|(i, &center)| {
            let radius = half.min(i).min(last - i);
            if radius == 0 {
                return center;
            }
            let neighborhood = &values[i - radius..=i + radius];
            let offset: f64 = neighborhood.iter().map(|&v| v - center).sum();
            center + offset / neighborhood.len() as f64
        })
        .collect();
    Ok(smoothed)
}
