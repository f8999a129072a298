//! Experiment orchestration
//!
//! A [`Study`] runs everything an [`ExperimentConfig`] enables, per policy:
//! the sweeps (exploration rate, planning budget, learning rate), a selection
//! per sweep, and then the comparisons. Every finished sweep or comparison is
//! recorded in the report before it is exported, so a failure part way
//! through still hands back everything computed so far.

use std::{error::Error, fmt};

use anyhow::Result;

use super::{
    comparison::{ComparisonPlan, ComparisonResult, run_comparison},
    selector::{Selections, select_best},
    space::Axis,
    sweep::{SweepResult, run_sweep},
};
use crate::{
    artifact::{ArtifactSink, PlotSummary},
    config::ExperimentConfig,
    env::Environment,
    train::RepetitionRunner,
};

/// Everything a study produced
#[derive(Debug, Clone, Default)]
pub struct StudyReport {
    /// Sweeps in execution order
    pub sweeps: Vec<SweepResult>,
    /// Best value per policy and swept axis
    pub selections: Selections,
    /// Comparisons in execution order
    pub comparisons: Vec<ComparisonResult>,
    /// Summaries of every exported plot
    pub summaries: Vec<PlotSummary>,
}

/// A study that stopped early, with the results it had already computed
#[derive(Debug)]
pub struct StudyFailure {
    /// Sweeps, selections and comparisons finished before the error
    pub report: StudyReport,
    /// What stopped the study
    pub error: anyhow::Error,
}

impl fmt::Display for StudyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Study stopped after {} sweeps and {} comparisons",
            self.report.sweeps.len(),
            self.report.comparisons.len()
        )
    }
}

impl Error for StudyFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.error)
    }
}

/// Runs a configured experiment end to end
#[derive(Debug, Clone)]
pub struct Study {
    config: ExperimentConfig,
    runner: RepetitionRunner,
}

impl Study {
    /// Validate `config` and prepare the runner
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let runner = RepetitionRunner::new(config.run_settings()?)?;
        Ok(Self { config, runner })
    }

    /// Configuration in use
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run every enabled sweep and comparison
    ///
    /// `make_env` builds a fresh environment from a seed for every repetition.
    /// Artifacts go to `sink`; `selections.json` records all selections. On
    /// error the partial report travels inside the [`StudyFailure`].
    pub fn run<E, EF, S>(&self, make_env: EF, sink: &mut S) -> Result<StudyReport, StudyFailure>
    where
        E: Environment,
        EF: Fn(u64) -> Result<E> + Sync,
        S: ArtifactSink + ?Sized,
    {
        let mut report = StudyReport::default();
        match self.fill(&mut report, &make_env, sink) {
            Ok(()) => {
                tracing::info!(
                    "Study finished: {} sweeps, {} selections, {} comparisons",
                    report.sweeps.len(),
                    report.selections.len(),
                    report.comparisons.len()
                );
                Ok(report)
            }
            Err(error) => {
                tracing::error!(
                    "Study stopped after {} sweeps and {} comparisons: {:#}",
                    report.sweeps.len(),
                    report.comparisons.len(),
                    error
                );
                Err(StudyFailure { report, error })
            }
        }
    }

    fn fill<E, EF, S>(&self, report: &mut StudyReport, make_env: &EF, sink: &mut S) -> Result<()>
    where
        E: Environment,
        EF: Fn(u64) -> Result<E> + Sync,
        S: ArtifactSink + ?Sized,
    {
        let config = &self.config;
        let defaults = config.default_hyperparameters();

        for &identity in &config.policies {
            for axis in Axis::ALL {
                if !config.toggles.sweeps(axis) {
                    continue;
                }
                let sweep = run_sweep(&self.runner, identity, &defaults, &config.grid(axis), make_env)?;
                let selection = select_best(&sweep, config.selection_basis);
                let exported = sweep.export(sink);
                report.sweeps.push(sweep);
                report.selections.insert(selection?);
                report.summaries.push(exported?);
            }
        }

        if !report.selections.is_empty() {
            sink.write_json("selections.json", &serde_json::to_value(&report.selections)?)?;
        }

        let mut plans = Vec::new();
        if config.toggles.compare_selected {
            plans.push(ComparisonPlan::selected(&config.policies, &report.selections, &defaults)?);
        }
        if config.toggles.compare_planning {
            for &identity in &config.policies {
                let selected = report.selections.apply_to(identity, &defaults)?;
                plans.push(ComparisonPlan::planning(identity, &selected, config.full_planning_budget));
            }
        }

        for plan in &plans {
            let comparison = run_comparison(&self.runner, plan, make_env)?;
            let exported = comparison.export(sink);
            report.comparisons.push(comparison);
            report.summaries.push(exported?);
        }
        Ok(())
    }
}
