//! Trial executor
//!
//! Runs one environment/policy pair for a fixed number of steps and records
//! the reward of every step. Episode boundaries are invisible to the trace:
//! a terminal step resets the environment and the recording simply goes on.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::curve::RewardTrace;
use crate::{
    env::Environment,
    error::HarnessError,
    policy::{Policy, Transition},
};

/// Bookkeeping attached to a trial's errors
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrialOptions {
    /// Repetition this trial belongs to (for error context)
    pub repetition: usize,

    /// Wall-clock limit for the whole trial
    pub time_limit: Option<Duration>,
}

/// Run one trial of `n_timesteps` steps
pub fn run_trial<E, P>(env: &mut E, policy: &mut P, n_timesteps: usize) -> Result<RewardTrace>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    run_trial_with(env, policy, n_timesteps, TrialOptions::default())
}

/// Run one trial with explicit options
///
/// Errors from the environment or policy are returned with a
/// [`HarnessError::Collaborator`] context naming the repetition and step; they
/// are never retried or replaced by a default reward.
pub fn run_trial_with<E, P>(
    env: &mut E,
    policy: &mut P,
    n_timesteps: usize,
    options: TrialOptions,
) -> Result<RewardTrace>
where
    E: Environment + ?Sized,
    P: Policy + ?Sized,
{
    let started = Instant::now();
    let repetition = options.repetition;
    let mut rewards = Vec::with_capacity(n_timesteps);

    let mut state =
        env.reset().with_context(|| HarnessError::Collaborator { repetition, step: 0 })?;

    for step in 0..n_timesteps {
        if let Some(limit) = options.time_limit
            && started.elapsed() > limit
        {
            return Err(HarnessError::TrialTimeout { repetition, step, limit }.into());
        }

        let collaborator = || HarnessError::Collaborator { repetition, step };

        let action = policy.select_action(state).with_context(collaborator)?;
        let result = env.step(action).with_context(collaborator)?;
        rewards.push(result.reward);

        policy
            .update(&Transition {
                state,
                action,
                reward: result.reward,
                done: result.done,
                next_state: result.next_state,
            })
            .with_context(collaborator)?;

        state = if result.done {
            env.reset().with_context(collaborator)?
        } else {
            result.next_state
        };
    }

    Ok(RewardTrace::new(rewards))
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::{
        env::{Action, State, StepResult},
        error::harness_error,
    };

    /// Chain of `length` states; reaching the end pays 1 and terminates
    struct Corridor {
        position: usize,
        length: usize,
        resets: usize,
    }

    impl Environment for Corridor {
        fn reset(&mut self) -> Result<State> {
            self.position = 0;
            self.resets += 1;
            Ok(0)
        }

        fn step(&mut self, action: Action) -> Result<StepResult> {
            if action > 1 {
                bail!("invalid action {}", action);
            }
            self.position += 1;
            let done = self.position == self.length;
            Ok(StepResult::new(self.position, if done { 1.0 } else { 0.0 }, done))
        }

        fn state_count(&self) -> usize {
            self.length + 1
        }

        fn action_count(&self) -> usize {
            2
        }
    }

    /// Always plays one action and counts updates
    struct Fixed {
        action: Action,
        updates: Vec<Transition>,
    }

    impl Policy for Fixed {
        fn select_action(&mut self, _state: State) -> Result<Action> {
            Ok(self.action)
        }

        fn update(&mut self, transition: &Transition) -> Result<()> {
            self.updates.push(*transition);
            Ok(())
        }
    }

    #[test]
    fn test_trace_spans_episode_boundaries() {
        let mut env = Corridor { position: 0, length: 3, resets: 0 };
        let mut policy = Fixed { action: 0, updates: Vec::new() };

        let trace = run_trial(&mut env, &mut policy, 7).unwrap();

        assert_eq!(trace.rewards(), &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        // Initial reset plus one after each of the two terminal steps
        assert_eq!(env.resets, 3);
    }

    #[test]
    fn test_update_runs_on_every_step_including_terminal() {
        let mut env = Corridor { position: 0, length: 2, resets: 0 };
        let mut policy = Fixed { action: 1, updates: Vec::new() };

        run_trial(&mut env, &mut policy, 4).unwrap();

        assert_eq!(policy.updates.len(), 4);
        assert!(policy.updates[1].done);
        assert_eq!(policy.updates[1].next_state, 2);
        // After the reset the next transition starts from the initial state again
        assert_eq!(policy.updates[2].state, 0);
    }

    #[test]
    fn test_environment_error_propagates_with_context() {
        let mut env = Corridor { position: 0, length: 5, resets: 0 };
        let mut policy = Fixed { action: 9, updates: Vec::new() };

        let options = TrialOptions { repetition: 4, time_limit: None };
        let err = run_trial_with(&mut env, &mut policy, 10, options).unwrap_err();

        assert_eq!(harness_error(&err), Some(&HarnessError::Collaborator { repetition: 4, step: 0 }));
        assert!(format!("{:#}", err).contains("invalid action 9"));
        assert!(policy.updates.is_empty());
    }

    #[test]
    fn test_zero_time_limit_aborts() {
        let mut env = Corridor { position: 0, length: 5, resets: 0 };
        let mut policy = Fixed { action: 0, updates: Vec::new() };
        let options = TrialOptions { repetition: 0, time_limit: Some(Duration::ZERO) };

        let result = run_trial_with(&mut env, &mut policy, 1_000_000, options);

        assert!(matches!(
            result.as_ref().map_err(harness_error),
            Err(Some(HarnessError::TrialTimeout { .. }))
        ));
    }
}
