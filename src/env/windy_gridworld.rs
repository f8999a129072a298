//! Stochastic Windy Gridworld
//!
//! The classic tabular benchmark from Sutton & Barto (Example 6.5), with a
//! stochastic wind:
//! - Grid: 10 columns by 7 rows, start at (0, 3), goal at (7, 3)
//! - Actions: 0 (up), 1 (right), 2 (down), 3 (left)
//! - Wind: each column pushes the agent up by `[0,0,0,1,1,1,2,2,1,0]`
//!   cells, but only with probability 0.9 per step
//! - Reward: -1 per step, +100 on reaching the goal (which ends the episode)
//!
//! States are indexed column-major as `x * height + y`.

use anyhow::{Result, bail};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Action, Environment, State, StepResult};

const WIDTH: usize = 10;
const HEIGHT: usize = 7;
const WINDS: [usize; WIDTH] = [0, 0, 0, 1, 1, 1, 2, 2, 1, 0];
const START: (usize, usize) = (0, 3);
const GOAL: (usize, usize) = (7, 3);

/// Windy Gridworld with stochastic wind
#[derive(Debug, Clone)]
pub struct WindyGridworld {
    location: (usize, usize),
    wind_proportion: f64,
    reward_per_step: f64,
    goal_reward: f64,
    rng: StdRng,
}

impl WindyGridworld {
    /// Number of actions (up, right, down, left)
    pub const N_ACTIONS: usize = 4;

    /// Create a gridworld whose wind is driven by `seed`
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Create a gridworld seeded from system entropy
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            location: START,
            wind_proportion: 0.9,
            reward_per_step: -1.0,
            goal_reward: 100.0,
            rng,
        }
    }

    /// Override the probability that the wind blows on a step
    pub fn with_wind_proportion(mut self, wind_proportion: f64) -> Self {
        self.wind_proportion = wind_proportion.clamp(0.0, 1.0);
        self
    }

    /// Current (x, y) location of the agent
    pub fn location(&self) -> (usize, usize) {
        self.location
    }

    /// Convert an (x, y) location to its state index
    pub fn location_to_state(location: (usize, usize)) -> State {
        location.0 * HEIGHT + location.1
    }

    /// Convert a state index back to its (x, y) location
    pub fn state_to_location(state: State) -> (usize, usize) {
        (state / HEIGHT, state % HEIGHT)
    }

    fn apply_move(&self, action: Action) -> (usize, usize) {
        let (x, y) = self.location;
        match action {
            0 => (x, (y + 1).min(HEIGHT - 1)),
            1 => ((x + 1).min(WIDTH - 1), y),
            2 => (x, y.saturating_sub(1)),
            _ => (x.saturating_sub(1), y),
        }
    }
}

impl Environment for WindyGridworld {
    fn reset(&mut self) -> Result<State> {
        self.location = START;
        Ok(Self::location_to_state(self.location))
    }

    fn step(&mut self, action: Action) -> Result<StepResult> {
        if action >= Self::N_ACTIONS {
            bail!("invalid action {} (gridworld has {} actions)", action, Self::N_ACTIONS);
        }

        let (x, mut y) = self.apply_move(action);
        // Wind strength is read from the column the agent moved into
        if self.rng.r#gen::<f64>() < self.wind_proportion {
            y = (y + WINDS[x]).min(HEIGHT - 1);
        }
        self.location = (x, y);

        let next_state = Self::location_to_state(self.location);
        if self.location == GOAL {
            Ok(StepResult::new(next_state, self.goal_reward, true))
        } else {
            Ok(StepResult::new(next_state, self.reward_per_step, false))
        }
    }

    fn state_count(&self) -> usize {
        WIDTH * HEIGHT
    }

    fn action_count(&self) -> usize {
        Self::N_ACTIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_returns_start_state() {
        let mut env = WindyGridworld::new(0);
        let state = env.reset().unwrap();
        assert_eq!(WindyGridworld::state_to_location(state), START);
        assert_eq!(env.state_count(), 70);
        assert_eq!(env.action_count(), 4);
    }

    #[test]
    fn test_state_index_roundtrip_covers_grid() {
        for x in 0..WIDTH {
            for y in 0..HEIGHT {
                let state = WindyGridworld::location_to_state((x, y));
                assert!(state < WIDTH * HEIGHT);
                assert_eq!(WindyGridworld::state_to_location(state), (x, y));
            }
        }
    }

    #[test]
    fn test_invalid_action_is_an_error() {
        let mut env = WindyGridworld::new(0);
        env.reset().unwrap();
        assert!(env.step(4).is_err());
    }

    #[test]
    fn test_walls_clip_movement_without_wind() {
        let mut env = WindyGridworld::new(0).with_wind_proportion(0.0);
        env.reset().unwrap();

        // Moving left from the start column stays in place
        let result = env.step(3).unwrap();
        assert_eq!(WindyGridworld::state_to_location(result.next_state), START);
        assert_eq!(result.reward, -1.0);
        assert!(!result.done);
    }

    #[test]
    fn test_reaching_goal_terminates_with_goal_reward() {
        let mut env = WindyGridworld::new(0).with_wind_proportion(0.0);
        env.reset().unwrap();

        // Without wind the goal is seven steps to the right
        for _ in 0..6 {
            assert!(!env.step(1).unwrap().done);
        }
        let result = env.step(1).unwrap();
        assert!(result.done);
        assert_eq!(result.reward, 100.0);
    }

    #[test]
    fn test_full_wind_pushes_agent_up() {
        let mut env = WindyGridworld::new(0).with_wind_proportion(1.0);
        env.reset().unwrap();

        for _ in 0..3 {
            env.step(1).unwrap();
        }
        // Column 3 has wind strength 1
        assert_eq!(env.location(), (3, 4));
    }

    #[test]
    fn test_same_seed_same_dynamics() {
        let mut a = WindyGridworld::new(11);
        let mut b = WindyGridworld::new(11);
        a.reset().unwrap();
        b.reset().unwrap();
        for step in 0..50 {
            let action = step % 4;
            assert_eq!(a.step(action).unwrap(), b.step(action).unwrap());
        }
    }
}
