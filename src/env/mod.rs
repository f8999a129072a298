//! Environment traits and implementations
//!
//! This module defines the tabular environment interface consumed by the
//! evaluation harness and provides a built-in reference environment.

use anyhow::Result;

/// Discrete state index in `0..state_count`
pub type State = usize;

/// Discrete action index in `0..action_count`
pub type Action = usize;

/// Core trait for tabular RL environments
///
/// The harness only ever resets, steps, and reads the (fixed) space sizes.
/// Any domain error (for example an out-of-range action) must be returned as
/// an `Err`; the harness propagates it unchanged.
pub trait Environment {
    /// Reset the environment and return the initial state
    fn reset(&mut self) -> Result<State>;

    /// Step the environment with an action
    fn step(&mut self, action: Action) -> Result<StepResult>;

    /// Number of discrete states
    fn state_count(&self) -> usize;

    /// Number of discrete actions
    fn action_count(&self) -> usize;
}

/// Result of an environment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// State reached after the action
    pub next_state: State,

    /// Reward received
    pub reward: f64,

    /// Whether the episode terminated
    pub done: bool,
}

impl StepResult {
    /// Create a step result
    pub fn new(next_state: State, reward: f64, done: bool) -> Self {
        Self { next_state, reward, done }
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn reset(&mut self) -> Result<State> {
        (**self).reset()
    }

    fn step(&mut self, action: Action) -> Result<StepResult> {
        (**self).step(action)
    }

    fn state_count(&self) -> usize {
        (**self).state_count()
    }

    fn action_count(&self) -> usize {
        (**self).action_count()
    }
}

pub mod windy_gridworld;

pub use windy_gridworld::WindyGridworld;
