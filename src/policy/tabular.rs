//! Shared tabular building blocks
//!
//! Both model-based agents keep a state-action value table and a count-based
//! model of observed transitions. Everything here iterates in insertion or
//! index order so that a seeded agent replays identically.

use anyhow::{Result, bail};
use rand::{Rng, rngs::StdRng, seq::SliceRandom};

use crate::{
    env::{Action, State},
    error::HarnessError,
};

/// Fail unless the environment has at least one state and one action
pub fn check_dimensions(state_count: usize, action_count: usize) -> Result<()> {
    if state_count == 0 {
        return Err(HarnessError::invalid("state_count", "environment reports no states").into());
    }
    if action_count == 0 {
        return Err(HarnessError::invalid("action_count", "environment reports no actions").into());
    }
    Ok(())
}

/// Dense state-action value table
#[derive(Debug, Clone)]
pub struct QTable {
    values: Vec<f64>,
    state_count: usize,
    action_count: usize,
}

impl QTable {
    /// Zero-initialized table
    pub fn new(state_count: usize, action_count: usize) -> Self {
        Self { values: vec![0.0; state_count * action_count], state_count, action_count }
    }

    /// Number of states
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Number of actions
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Fail unless `state` is a valid index
    pub fn check_state(&self, state: State) -> Result<()> {
        if state >= self.state_count {
            bail!("state {} out of range (state_count = {})", state, self.state_count);
        }
        Ok(())
    }

    /// Fail unless `state` and `action` are valid indices
    pub fn check_pair(&self, state: State, action: Action) -> Result<()> {
        self.check_state(state)?;
        if action >= self.action_count {
            bail!("action {} out of range (action_count = {})", action, self.action_count);
        }
        Ok(())
    }

    /// Value of one pair
    pub fn get(&self, state: State, action: Action) -> f64 {
        self.values[state * self.action_count + action]
    }

    /// Row of action values for `state`
    pub fn row(&self, state: State) -> &[f64] {
        let start = state * self.action_count;
        &self.values[start..start + self.action_count]
    }

    /// Largest action value in `state`
    pub fn max_value(&self, state: State) -> f64 {
        self.row(state).iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action with uniform random tie-breaking
    pub fn greedy_action(&self, state: State, rng: &mut StdRng) -> Action {
        let best = self.max_value(state);
        let candidates: Vec<Action> = self
            .row(state)
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == best)
            .map(|(action, _)| action)
            .collect();
        // The row is never empty, so there is always at least one maximizer
        candidates.choose(rng).copied().unwrap_or(0)
    }

    /// Epsilon-greedy action selection
    pub fn epsilon_greedy(&self, state: State, epsilon: f64, rng: &mut StdRng) -> Action {
        if rng.r#gen::<f64>() < epsilon {
            rng.gen_range(0..self.action_count)
        } else {
            self.greedy_action(state, rng)
        }
    }

    /// One-step temporal-difference target: `r + γ max_a Q(s', a)` (no
    /// bootstrap past a terminal transition)
    pub fn td_target(&self, reward: f64, done: bool, next_state: State, discount: f64) -> f64 {
        if done { reward } else { reward + discount * self.max_value(next_state) }
    }

    /// Move `Q(s, a)` toward `target` by `learning_rate`
    pub fn move_towards(&mut self, state: State, action: Action, target: f64, learning_rate: f64) {
        let index = state * self.action_count + action;
        self.values[index] += learning_rate * (target - self.values[index]);
    }
}

/// Observed outcome of one state-action pair
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Successor state
    pub next_state: State,
    /// Times this successor was observed
    pub count: u64,
    /// Sum of rewards observed for this successor
    pub reward_sum: f64,
    /// Whether the last observation of this successor was terminal
    pub done: bool,
}

impl Outcome {
    /// Mean observed reward
    pub fn mean_reward(&self) -> f64 {
        self.reward_sum / self.count as f64
    }
}

/// Count-based model of the environment dynamics
#[derive(Debug, Clone)]
pub struct TransitionModel {
    action_count: usize,
    // Outcomes per pair, indexed by `state * action_count + action`
    outcomes: Vec<Vec<Outcome>>,
    // Pairs in first-visit order, for uniform replay sampling
    visited: Vec<(State, Action)>,
    // Pairs that have led into each state, in first-observation order
    predecessors: Vec<Vec<(State, Action)>>,
}

impl TransitionModel {
    /// Empty model
    pub fn new(state_count: usize, action_count: usize) -> Self {
        Self {
            action_count,
            outcomes: vec![Vec::new(); state_count * action_count],
            visited: Vec::new(),
            predecessors: vec![Vec::new(); state_count],
        }
    }

    /// Record one real transition
    pub fn observe(&mut self, state: State, action: Action, reward: f64, done: bool, next_state: State) {
        let index = state * self.action_count + action;
        let outcomes = &mut self.outcomes[index];
        if outcomes.is_empty() {
            self.visited.push((state, action));
        }

        match outcomes.iter_mut().find(|outcome| outcome.next_state == next_state) {
            Some(outcome) => {
                outcome.count += 1;
                outcome.reward_sum += reward;
                outcome.done = done;
            }
            None => {
                outcomes.push(Outcome { next_state, count: 1, reward_sum: reward, done });
                let preds = &mut self.predecessors[next_state];
                if !preds.contains(&(state, action)) {
                    preds.push((state, action));
                }
            }
        }
    }

    /// State-action pairs observed at least once
    pub fn visited(&self) -> &[(State, Action)] {
        &self.visited
    }

    /// Pairs that have been observed to lead into `state`
    pub fn predecessors(&self, state: State) -> &[(State, Action)] {
        &self.predecessors[state]
    }

    /// Outcomes observed for one pair
    pub fn outcomes(&self, state: State, action: Action) -> &[Outcome] {
        &self.outcomes[state * self.action_count + action]
    }

    /// Mean reward for `(state, action) -> next_state`, if it was observed
    pub fn mean_reward(&self, state: State, action: Action, next_state: State) -> Option<f64> {
        self.outcomes(state, action)
            .iter()
            .find(|outcome| outcome.next_state == next_state)
            .map(Outcome::mean_reward)
    }

    /// Uniformly pick a previously visited pair
    pub fn sample_visited(&self, rng: &mut StdRng) -> Option<(State, Action)> {
        self.visited.choose(rng).copied()
    }

    /// Sample a successor in proportion to its observation count
    pub fn sample_outcome(&self, state: State, action: Action, rng: &mut StdRng) -> Option<&Outcome> {
        let outcomes = self.outcomes(state, action);
        let total: u64 = outcomes.iter().map(|outcome| outcome.count).sum();
        if total == 0 {
            return None;
        }

        let mut remaining = rng.gen_range(0..total);
        for outcome in outcomes {
            if remaining < outcome.count {
                return Some(outcome);
            }
            remaining -= outcome.count;
        }
        outcomes.last()
    }
}
