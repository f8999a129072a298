//! Tabular control policies
//!
//! This module defines the policy interface consumed by the evaluation
//! harness, the enumerated [`PolicyIdentity`] used to pick an agent
//! constructor, and the two model-based reference agents.

use std::{fmt, str::FromStr};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    env::{Action, State},
    error::HarnessError,
    train::HyperparameterConfig,
};

pub mod dyna;
pub mod prioritized_sweeping;
pub mod tabular;

pub use dyna::DynaAgent;
pub use prioritized_sweeping::PrioritizedSweepingAgent;

/// One real environment transition, as handed to [`Policy::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// State the action was taken in
    pub state: State,
    /// Action taken
    pub action: Action,
    /// Reward received
    pub reward: f64,
    /// Whether the transition ended the episode
    pub done: bool,
    /// State reached
    pub next_state: State,
}

/// Core trait for learning control policies
///
/// `update` is called after every real step, including terminal ones.
pub trait Policy {
    /// Choose an action for `state`
    fn select_action(&mut self, state: State) -> Result<Action>;

    /// Learn from one real transition
    fn update(&mut self, transition: &Transition) -> Result<()>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn select_action(&mut self, state: State) -> Result<Action> {
        (**self).select_action(state)
    }

    fn update(&mut self, transition: &Transition) -> Result<()> {
        (**self).update(transition)
    }
}

/// Which model-based agent to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyIdentity {
    /// Dyna-Q with uniform model replay
    Dyna,
    /// Prioritized sweeping over predecessor state-action pairs
    PrioritizedSweeping,
}

impl PolicyIdentity {
    /// All known identities, in presentation order
    pub const ALL: [PolicyIdentity; 2] = [PolicyIdentity::Dyna, PolicyIdentity::PrioritizedSweeping];

    /// Human-readable name used in plot titles and file names
    pub fn name(&self) -> &'static str {
        match self {
            PolicyIdentity::Dyna => "Dyna",
            PolicyIdentity::PrioritizedSweeping => "Prioritized Sweeping",
        }
    }

    /// File-name friendly name
    pub fn slug(&self) -> &'static str {
        match self {
            PolicyIdentity::Dyna => "dyna",
            PolicyIdentity::PrioritizedSweeping => "prioritized_sweeping",
        }
    }

    /// Construct a fresh agent of this identity
    ///
    /// Policy-specific extras (currently only the prioritized-sweeping queue
    /// settings) come from `options`; everything else from `hyperparameters`.
    pub fn build(
        &self,
        state_count: usize,
        action_count: usize,
        hyperparameters: &HyperparameterConfig,
        options: &PolicyOptions,
        seed: u64,
    ) -> Result<Box<dyn Policy + Send>> {
        hyperparameters.validate()?;
        let policy: Box<dyn Policy + Send> = match self {
            PolicyIdentity::Dyna => {
                Box::new(DynaAgent::new(state_count, action_count, hyperparameters, seed)?)
            }
            PolicyIdentity::PrioritizedSweeping => Box::new(PrioritizedSweepingAgent::new(
                state_count,
                action_count,
                hyperparameters,
                options.priority_threshold,
                options.queue_capacity,
                seed,
            )?),
        };
        Ok(policy)
    }
}

impl fmt::Display for PolicyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyIdentity {
    type Err = HarnessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String =
            value.chars().filter(|c| !matches!(c, ' ' | '_' | '-')).collect::<String>();
        match normalized.to_ascii_lowercase().as_str() {
            "dyna" => Ok(PolicyIdentity::Dyna),
            "prioritizedsweeping" => Ok(PolicyIdentity::PrioritizedSweeping),
            _ => Err(HarnessError::UnknownPolicy { name: value.to_string() }),
        }
    }
}

impl TryFrom<String> for PolicyIdentity {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicyIdentity> for String {
    fn from(identity: PolicyIdentity) -> Self {
        match identity {
            PolicyIdentity::Dyna => "Dyna".to_string(),
            PolicyIdentity::PrioritizedSweeping => "PrioritizedSweeping".to_string(),
        }
    }
}

/// Policy-specific construction options
///
/// These are held constant for a whole experiment; they are never swept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyOptions {
    /// Maximum number of queued state-action pairs for prioritized sweeping
    /// (`None` = unbounded)
    pub queue_capacity: Option<usize>,

    /// Minimum priority for a pair to enter the prioritized-sweeping queue
    pub priority_threshold: f64,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self { queue_capacity: None, priority_threshold: 0.01 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_identities() {
        assert_eq!("Dyna".parse::<PolicyIdentity>().unwrap(), PolicyIdentity::Dyna);
        assert_eq!(
            "Prioritized Sweeping".parse::<PolicyIdentity>().unwrap(),
            PolicyIdentity::PrioritizedSweeping
        );
        assert_eq!(
            "prioritized_sweeping".parse::<PolicyIdentity>().unwrap(),
            PolicyIdentity::PrioritizedSweeping
        );
    }

    #[test]
    fn test_unknown_identity_is_configuration_error() {
        let err = "Foo".parse::<PolicyIdentity>().unwrap_err();
        assert_eq!(err, HarnessError::UnknownPolicy { name: "Foo".to_string() });
        assert!(err.is_configuration());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&PolicyIdentity::PrioritizedSweeping).unwrap();
        assert_eq!(json, "\"PrioritizedSweeping\"");
        let parsed: PolicyIdentity = serde_json::from_str("\"Dyna\"").unwrap();
        assert_eq!(parsed, PolicyIdentity::Dyna);
        assert!(serde_json::from_str::<PolicyIdentity>("\"Foo\"").is_err());
    }

    #[test]
    fn test_build_both_identities() {
        let hyper = HyperparameterConfig::default();
        for identity in PolicyIdentity::ALL {
            let mut policy = identity.build(5, 2, &hyper, &PolicyOptions::default(), 3).unwrap();
            let action = policy.select_action(0).unwrap();
            assert!(action < 2);
        }
    }
}
