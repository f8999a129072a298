//! Hyperparameter axes and value grids

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{error::HarnessError, train::HyperparameterConfig};

/// A swept parameter value (continuous or discrete)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Discrete integer value
    Discrete(i64),
    /// Continuous floating-point value
    Continuous(f64),
}

impl ParameterValue {
    /// Get as f64 (discrete values are cast)
    pub fn as_f64(&self) -> f64 {
        match self {
            ParameterValue::Continuous(v) => *v,
            ParameterValue::Discrete(v) => *v as f64,
        }
    }

    /// Get as i64 (for discrete params)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParameterValue::Discrete(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Continuous(v) => write!(f, "{}", v),
            ParameterValue::Discrete(v) => write!(f, "{}", v),
        }
    }
}

/// Hyperparameter that a sweep can vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Epsilon of the epsilon-greedy policy
    ExplorationRate,
    /// Number of model updates per real step
    PlanningBudget,
    /// Value update step size
    LearningRate,
}

impl Axis {
    /// All axes, in the order experiments run them
    pub const ALL: [Axis; 3] = [Axis::ExplorationRate, Axis::PlanningBudget, Axis::LearningRate];

    /// Stable identifier
    pub fn name(&self) -> &'static str {
        match self {
            Axis::ExplorationRate => "exploration_rate",
            Axis::PlanningBudget => "planning_budget",
            Axis::LearningRate => "learning_rate",
        }
    }

    /// Suffix used in artifact file names
    pub fn file_stem(&self) -> &'static str {
        match self {
            Axis::ExplorationRate => "egreedy",
            Axis::PlanningBudget => "n_planning_updates",
            Axis::LearningRate => "learning_rate",
        }
    }

    /// Phrase completing "effect of ..." in plot titles
    pub fn description(&self) -> &'static str {
        match self {
            Axis::ExplorationRate => "ε-greedy",
            Axis::PlanningBudget => "number of planning updates per iteration",
            Axis::LearningRate => "learning rate",
        }
    }

    /// Legend label for one swept value
    pub fn label(&self, value: &ParameterValue) -> String {
        match self {
            Axis::ExplorationRate => format!("ε = {}", value),
            Axis::PlanningBudget => format!("Number of planning updates = {}", value),
            Axis::LearningRate => format!("Learning rate = {}", value),
        }
    }

    /// Read this axis from a configuration
    pub fn value_of(&self, config: &HyperparameterConfig) -> ParameterValue {
        match self {
            Axis::ExplorationRate => ParameterValue::Continuous(config.exploration_rate),
            Axis::PlanningBudget => ParameterValue::Discrete(config.planning_budget as i64),
            Axis::LearningRate => ParameterValue::Continuous(config.learning_rate),
        }
    }

    /// Copy of `base` with this axis overridden by `value`
    pub fn apply(&self, base: &HyperparameterConfig, value: &ParameterValue) -> Result<HyperparameterConfig> {
        let config = match self {
            Axis::ExplorationRate => base.exploration_rate(value.as_f64()),
            Axis::LearningRate => base.learning_rate(value.as_f64()),
            Axis::PlanningBudget => {
                let budget = value
                    .as_i64()
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| {
                        HarnessError::invalid(
                            "planning_budget",
                            format!("expected a non-negative integer, got {}", value),
                        )
                    })?;
                base.planning_budget(budget)
            }
        };
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of values to sweep along one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisGrid {
    axis: Axis,
    values: Vec<ParameterValue>,
}

impl AxisGrid {
    /// Grid over arbitrary values
    pub fn new(axis: Axis, values: Vec<ParameterValue>) -> Self {
        Self { axis, values }
    }

    /// Exploration-rate grid
    pub fn exploration_rate(values: &[f64]) -> Self {
        Self::new(Axis::ExplorationRate, values.iter().map(|&v| ParameterValue::Continuous(v)).collect())
    }

    /// Learning-rate grid
    pub fn learning_rate(values: &[f64]) -> Self {
        Self::new(Axis::LearningRate, values.iter().map(|&v| ParameterValue::Continuous(v)).collect())
    }

    /// Planning-budget grid
    pub fn planning_budget(values: &[usize]) -> Self {
        Self::new(Axis::PlanningBudget, values.iter().map(|&v| ParameterValue::Discrete(v as i64)).collect())
    }

    /// Axis being varied
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Values in declaration order
    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }

    /// Check that the grid is non-empty and every value is valid on `base`
    pub fn validate(&self, base: &HyperparameterConfig) -> Result<()> {
        if self.values.is_empty() {
            return Err(HarnessError::invalid(self.axis.name(), "value list is empty").into());
        }
        for value in &self.values {
            self.axis.apply(base, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides_only_the_axis() {
        let base = HyperparameterConfig::default();
        let config = Axis::ExplorationRate.apply(&base, &ParameterValue::Continuous(0.25)).unwrap();
        assert_eq!(config.exploration_rate, 0.25);
        assert_eq!(config.learning_rate, base.learning_rate);
        assert_eq!(config.planning_budget, base.planning_budget);
        assert_eq!(config.discount, base.discount);

        let config = Axis::PlanningBudget.apply(&base, &ParameterValue::Discrete(15)).unwrap();
        assert_eq!(config.planning_budget, 15);
        assert_eq!(Axis::PlanningBudget.value_of(&config), ParameterValue::Discrete(15));
    }

    #[test]
    fn test_planning_budget_rejects_non_integers() {
        let base = HyperparameterConfig::default();
        assert!(Axis::PlanningBudget.apply(&base, &ParameterValue::Continuous(1.5)).is_err());
        assert!(Axis::PlanningBudget.apply(&base, &ParameterValue::Discrete(-1)).is_err());
    }

    #[test]
    fn test_grid_validation() {
        let base = HyperparameterConfig::default();
        assert!(AxisGrid::exploration_rate(&[0.01, 0.05, 0.1, 0.25]).validate(&base).is_ok());
        assert!(AxisGrid::exploration_rate(&[]).validate(&base).is_err());
        assert!(AxisGrid::exploration_rate(&[0.1, 1.2]).validate(&base).is_err());
        assert!(AxisGrid::learning_rate(&[0.0]).validate(&base).is_err());
    }

    #[test]
    fn test_labels_match_legends() {
        assert_eq!(Axis::ExplorationRate.label(&ParameterValue::Continuous(0.05)), "ε = 0.05");
        assert_eq!(
            Axis::PlanningBudget.label(&ParameterValue::Discrete(5)),
            "Number of planning updates = 5"
        );
        assert_eq!(Axis::LearningRate.label(&ParameterValue::Continuous(1.0)), "Learning rate = 1");
    }

    #[test]
    fn test_parameter_value_json_is_plain_number() {
        assert_eq!(serde_json::to_string(&ParameterValue::Discrete(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&ParameterValue::Continuous(0.5)).unwrap(), "0.5");
        let parsed: ParameterValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(parsed, ParameterValue::Continuous(0.25));
    }
}
