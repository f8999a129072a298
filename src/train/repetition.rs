//! Repetition runner
//!
//! Evaluates one (policy, hyperparameter) configuration by running
//! `n_repetitions` independent trials, each with a freshly constructed
//! environment and policy, then averaging the reward traces step-wise and
//! smoothing the result into a [`LearningCurve`].
//!
//! # Independence
//!
//! No state is shared between repetitions: every repetition receives its own
//! seeds and owns its environment/policy pair for its whole lifetime. With the
//! `parallel` feature the repetitions can run on the rayon pool; traces are
//! merged by repetition index, so the curve is identical to a sequential run.

use std::time::Instant;

use anyhow::Result;

use super::{
    config::{HyperparameterConfig, RunSettings},
    curve::{LearningCurve, RewardTrace},
    trial::{TrialOptions, run_trial_with},
};
use crate::{
    env::Environment,
    policy::{Policy, PolicyIdentity},
    utils::{RepetitionSeeds, resolve_base_seed},
};

/// Runs repeated trials of one configuration
#[derive(Debug, Clone)]
pub struct RepetitionRunner {
    settings: RunSettings,
}

impl RepetitionRunner {
    /// Create a runner, validating the settings up front
    pub fn new(settings: RunSettings) -> Result<Self> {
        settings.validate()?;
        #[cfg(not(feature = "parallel"))]
        if settings.parallel {
            tracing::warn!("Parallel repetitions requested but the `parallel` feature is off; running sequentially");
        }
        Ok(Self { settings })
    }

    /// Settings used for every run
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Learning curve for `identity` with `hyperparameters`
    ///
    /// `make_env` receives the environment seed of each repetition and must
    /// return a fresh instance.
    pub fn run<E, EF>(
        &self,
        identity: PolicyIdentity,
        hyperparameters: &HyperparameterConfig,
        make_env: EF,
    ) -> Result<LearningCurve>
    where
        E: Environment,
        EF: Fn(u64) -> Result<E> + Sync,
    {
        // Bad hyperparameters fail here, before any environment exists
        hyperparameters.validate()?;
        let options = self.settings.policy_options;

        tracing::debug!(
            "Evaluating {} (lr={}, gamma={}, eps={}, planning={})",
            identity,
            hyperparameters.learning_rate,
            hyperparameters.discount,
            hyperparameters.exploration_rate,
            hyperparameters.planning_budget
        );

        self.run_with(make_env, |env: &E, seed| {
            identity.build(env.state_count(), env.action_count(), hyperparameters, &options, seed)
        })
    }

    /// Like [`RepetitionRunner::run`], resolving the policy identity by name
    ///
    /// An unknown name is a configuration error raised before any environment
    /// is constructed.
    pub fn run_named<E, EF>(
        &self,
        policy: &str,
        hyperparameters: &HyperparameterConfig,
        make_env: EF,
    ) -> Result<LearningCurve>
    where
        E: Environment,
        EF: Fn(u64) -> Result<E> + Sync,
    {
        let identity: PolicyIdentity = policy.parse()?;
        self.run(identity, hyperparameters, make_env)
    }

    /// Learning curve for arbitrary environment and policy factories
    ///
    /// `make_policy` is called once per repetition with that repetition's
    /// fresh environment and policy seed.
    pub fn run_with<E, P, EF, PF>(&self, make_env: EF, make_policy: PF) -> Result<LearningCurve>
    where
        E: Environment,
        P: Policy,
        EF: Fn(u64) -> Result<E> + Sync,
        PF: Fn(&E, u64) -> Result<P> + Sync,
    {
        let started = Instant::now();
        let base_seed = resolve_base_seed(self.settings.seed);
        let seeds = RepetitionSeeds::for_run(base_seed, self.settings.n_repetitions);

        let traces = self.collect_traces(&seeds, &make_env, &make_policy)?;
        let curve = LearningCurve::from_traces(&traces, self.settings.smoothing_window)?;

        tracing::debug!(
            "{} repetitions x {} steps in {:.2}s (mean reward {:.4})",
            self.settings.n_repetitions,
            self.settings.n_timesteps,
            started.elapsed().as_secs_f64(),
            curve.raw_mean()
        );
        Ok(curve)
    }

    fn collect_traces<E, P, EF, PF>(
        &self,
        seeds: &[RepetitionSeeds],
        make_env: &EF,
        make_policy: &PF,
    ) -> Result<Vec<RewardTrace>>
    where
        E: Environment,
        P: Policy,
        EF: Fn(u64) -> Result<E> + Sync,
        PF: Fn(&E, u64) -> Result<P> + Sync,
    {
        #[cfg(feature = "parallel")]
        if self.settings.parallel {
            use rayon::prelude::*;
            return seeds
                .par_iter()
                .enumerate()
                .map(|(rep, seeds)| self.run_repetition(rep, *seeds, make_env, make_policy))
                .collect();
        }

        seeds
            .iter()
            .enumerate()
            .map(|(rep, seeds)| self.run_repetition(rep, *seeds, make_env, make_policy))
            .collect()
    }

    fn run_repetition<E, P, EF, PF>(
        &self,
        repetition: usize,
        seeds: RepetitionSeeds,
        make_env: &EF,
        make_policy: &PF,
    ) -> Result<RewardTrace>
    where
        E: Environment,
        P: Policy,
        EF: Fn(u64) -> Result<E>,
        PF: Fn(&E, u64) -> Result<P>,
    {
        let mut env = make_env(seeds.environment)?;
        let mut policy = make_policy(&env, seeds.policy)?;

        let options = TrialOptions { repetition, time_limit: self.settings.trial_timeout };
        let trace = run_trial_with(&mut env, &mut policy, self.settings.n_timesteps, options)?;

        tracing::trace!("Repetition {} total reward {:.1}", repetition, trace.total());
        Ok(trace)
    }
}
