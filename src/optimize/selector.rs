//! Best-value selection over a sweep
//!
//! The score of a curve is its mean reward over the horizon. Selection is a
//! stable argmax: ties go to the value declared first, and non-finite scores
//! are never selected.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{
    space::{Axis, ParameterValue},
    sweep::SweepResult,
};
use crate::{
    error::HarnessError,
    policy::PolicyIdentity,
    train::{HyperparameterConfig, LearningCurve},
};

/// Which version of a curve is scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionBasis {
    /// Mean of the smoothed curve (what the plots show)
    #[default]
    Smoothed,
    /// Mean of the across-repetition average before smoothing
    Raw,
}

impl SelectionBasis {
    /// Score `curve` under this basis
    pub fn score(&self, curve: &LearningCurve) -> f64 {
        match self {
            SelectionBasis::Smoothed => curve.mean(),
            SelectionBasis::Raw => curve.raw_mean(),
        }
    }
}

impl fmt::Display for SelectionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionBasis::Smoothed => f.write_str("smoothed"),
            SelectionBasis::Raw => f.write_str("raw"),
        }
    }
}

/// Best value of one axis for one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    /// Policy the sweep belonged to
    pub policy: PolicyIdentity,
    /// Axis that was swept
    pub axis: Axis,
    /// Selected value
    pub value: ParameterValue,
    /// Score of the selected curve
    pub score: f64,
    /// How the score was computed
    pub basis: SelectionBasis,
}

/// Index of the highest finite score; the first one wins ties
pub fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Select the best-scoring value of a sweep
pub fn select_best(sweep: &SweepResult, basis: SelectionBasis) -> Result<SelectionOutcome> {
    let scores: Vec<f64> = sweep.iter().map(|entry| basis.score(&entry.curve)).collect();

    for (entry, score) in sweep.iter().zip(&scores) {
        if !score.is_finite() {
            tracing::warn!("{} {}: score {} is not comparable, skipping", sweep.identity(), entry.label, score);
        }
    }

    let Some(index) = argmax(&scores) else {
        return Err(HarnessError::EmptySweep { axis: sweep.axis().name().to_string() }.into());
    };
    let entry = &sweep.entries()[index];

    tracing::info!(
        "{}: best {} is {} ({} mean {:.4})",
        sweep.identity(),
        sweep.axis().name(),
        entry.value,
        basis,
        scores[index]
    );

    Ok(SelectionOutcome {
        policy: sweep.identity(),
        axis: sweep.axis(),
        value: entry.value,
        score: scores[index],
        basis,
    })
}

/// All selections of an experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    outcomes: Vec<SelectionOutcome>,
}

impl Selections {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, replacing an earlier one for the same policy and axis
    pub fn insert(&mut self, outcome: SelectionOutcome) {
        self.outcomes.retain(|o| !(o.policy == outcome.policy && o.axis == outcome.axis));
        self.outcomes.push(outcome);
    }

    /// Outcome for `policy` along `axis`
    pub fn get(&self, policy: PolicyIdentity, axis: Axis) -> Option<&SelectionOutcome> {
        self.outcomes.iter().find(|o| o.policy == policy && o.axis == axis)
    }

    /// Outcomes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SelectionOutcome> {
        self.outcomes.iter()
    }

    /// Number of outcomes
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// `defaults` with every axis selected for `policy` applied
    ///
    /// Axes without a selection keep their default.
    pub fn apply_to(&self, policy: PolicyIdentity, defaults: &HyperparameterConfig) -> Result<HyperparameterConfig> {
        let mut config = *defaults;
        for outcome in self.outcomes.iter().filter(|o| o.policy == policy) {
            config = outcome.axis.apply(&config, &outcome.value)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::harness_error, train::RewardTrace};

    fn constant_curve(value: f64) -> LearningCurve {
        LearningCurve::from_traces(&[RewardTrace::new(vec![value; 9])], 3).unwrap()
    }

    fn sweep(axis: Axis, points: &[(ParameterValue, f64)]) -> SweepResult {
        let mut result = SweepResult::new(PolicyIdentity::Dyna, axis);
        for (value, mean) in points {
            let hyper = axis.apply(&HyperparameterConfig::default(), value).unwrap();
            result.push(*value, hyper, constant_curve(*mean), 0.0);
        }
        result
    }

    #[test]
    fn test_selects_highest_mean() {
        let result = sweep(
            Axis::LearningRate,
            &[
                (ParameterValue::Continuous(0.1), 3.0),
                (ParameterValue::Continuous(0.5), 7.0),
                (ParameterValue::Continuous(1.0), 5.0),
            ],
        );
        let outcome = select_best(&result, SelectionBasis::Smoothed).unwrap();
        assert_eq!(outcome.value, ParameterValue::Continuous(0.5));
        assert_eq!(outcome.score, 7.0);
        assert_eq!(outcome.axis, Axis::LearningRate);
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        assert_eq!(argmax(&[1.0, 4.0, 4.0, 2.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN, 2.0, 2.0]), Some(1));
        assert_eq!(argmax(&[-1.0]), Some(0));
    }

    #[test]
    fn test_no_finite_score_is_empty_sweep() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f64::NAN, f64::INFINITY]), None);

        let empty = SweepResult::new(PolicyIdentity::Dyna, Axis::ExplorationRate);
        let err = select_best(&empty, SelectionBasis::Raw).unwrap_err();
        assert_eq!(
            harness_error(&err),
            Some(&HarnessError::EmptySweep { axis: "exploration_rate".to_string() })
        );
    }

    #[test]
    fn test_raw_basis_can_disagree_with_smoothed() {
        // Smoothing [0, 6, 0] with a window of 3 gives [0, 2, 0]
        let peaked = LearningCurve::from_traces(&[RewardTrace::new(vec![0.0, 6.0, 0.0])], 3).unwrap();
        let flat = LearningCurve::from_traces(&[RewardTrace::new(vec![1.0; 3])], 3).unwrap();

        let mut result = SweepResult::new(PolicyIdentity::Dyna, Axis::PlanningBudget);
        result.push(ParameterValue::Discrete(1), HyperparameterConfig::default(), flat, 0.0);
        result.push(ParameterValue::Discrete(5), HyperparameterConfig::default(), peaked, 0.0);

        assert_eq!(select_best(&result, SelectionBasis::Smoothed).unwrap().value, ParameterValue::Discrete(1));
        assert_eq!(select_best(&result, SelectionBasis::Raw).unwrap().value, ParameterValue::Discrete(5));
    }

    #[test]
    fn test_apply_selections_to_defaults() {
        let mut selections = Selections::new();
        let lr = sweep(
            Axis::LearningRate,
            &[(ParameterValue::Continuous(0.1), 1.0), (ParameterValue::Continuous(1.0), 2.0)],
        );
        let planning = sweep(
            Axis::PlanningBudget,
            &[(ParameterValue::Discrete(15), 3.0), (ParameterValue::Discrete(1), 0.0)],
        );
        selections.insert(select_best(&lr, SelectionBasis::Smoothed).unwrap());
        selections.insert(select_best(&planning, SelectionBasis::Smoothed).unwrap());

        let config = selections.apply_to(PolicyIdentity::Dyna, &HyperparameterConfig::default()).unwrap();
        assert_eq!(config.learning_rate, 1.0);
        assert_eq!(config.planning_budget, 15);
        assert_eq!(config.exploration_rate, 0.05);

        let untouched =
            selections.apply_to(PolicyIdentity::PrioritizedSweeping, &HyperparameterConfig::default()).unwrap();
        assert_eq!(untouched, HyperparameterConfig::default());
    }
}
