//! Dyna-Q agent
//!
//! Tabular Q-learning on real transitions, plus `planning_budget` simulated
//! one-step updates per real step drawn uniformly from the learned model
//! (Sutton & Barto, section 8.2). With a planning budget of zero this is
//! plain Q-learning.

use anyhow::Result;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    Policy, Transition,
    tabular::{QTable, TransitionModel, check_dimensions},
};
use crate::{
    env::{Action, State},
    train::HyperparameterConfig,
};

/// Dyna-Q with an epsilon-greedy behavior policy
#[derive(Debug, Clone)]
pub struct DynaAgent {
    q: QTable,
    model: TransitionModel,
    learning_rate: f64,
    discount: f64,
    epsilon: f64,
    planning_budget: usize,
    rng: StdRng,
}

impl DynaAgent {
    /// Create an agent with a zero-initialized value table and empty model
    pub fn new(
        state_count: usize,
        action_count: usize,
        hyperparameters: &HyperparameterConfig,
        seed: u64,
    ) -> Result<Self> {
        check_dimensions(state_count, action_count)?;
        hyperparameters.validate()?;
        Ok(Self {
            q: QTable::new(state_count, action_count),
            model: TransitionModel::new(state_count, action_count),
            learning_rate: hyperparameters.learning_rate,
            discount: hyperparameters.discount,
            epsilon: hyperparameters.exploration_rate,
            planning_budget: hyperparameters.planning_budget,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Learned state-action values
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    /// Learned transition model
    pub fn model(&self) -> &TransitionModel {
        &self.model
    }

    fn plan(&mut self) {
        for _ in 0..self.planning_budget {
            let Some((state, action)) = self.model.sample_visited(&mut self.rng) else {
                return;
            };
            let Some(outcome) = self.model.sample_outcome(state, action, &mut self.rng) else {
                continue;
            };
            let target =
                self.q.td_target(outcome.mean_reward(), outcome.done, outcome.next_state, self.discount);
            self.q.move_towards(state, action, target, self.learning_rate);
        }
    }
}

impl Policy for DynaAgent {
    fn select_action(&mut self, state: State) -> Result<Action> {
        self.q.check_state(state)?;
        Ok(self.q.epsilon_greedy(state, self.epsilon, &mut self.rng))
    }

    fn update(&mut self, transition: &Transition) -> Result<()> {
        let Transition { state, action, reward, done, next_state } = *transition;
        self.q.check_pair(state, action)?;
        self.q.check_state(next_state)?;

        self.model.observe(state, action, reward, done, next_state);
        let target = self.q.td_target(reward, done, next_state, self.discount);
        self.q.move_towards(state, action, target, self.learning_rate);

        self.plan();
        Ok(())
    }
}
