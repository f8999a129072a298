//! Sweep driver
//!
//! Varies one hyperparameter axis over an ordered list of values, holding the
//! others at their defaults, and evaluates every value with the repetition
//! runner. The result keeps the declared value order everywhere: in
//! iteration, in the plot legend and in the exported files.

use std::time::Instant;

use anyhow::Result;

use super::space::{Axis, AxisGrid, ParameterValue};
use crate::{
    artifact::{ArtifactSink, ExportedCurve, PlotSummary, export_curves},
    env::Environment,
    policy::PolicyIdentity,
    train::{HyperparameterConfig, LearningCurve, RepetitionRunner},
};

/// One evaluated value of a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    /// Swept value
    pub value: ParameterValue,
    /// Legend label
    pub label: String,
    /// Full configuration the curve was produced with
    pub hyperparameters: HyperparameterConfig,
    /// Resulting learning curve
    pub curve: LearningCurve,
    /// Wall-clock seconds spent on this value
    pub elapsed_secs: f64,
}

/// Curves of one policy along one axis, in declared value order
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    identity: PolicyIdentity,
    axis: Axis,
    entries: Vec<SweepEntry>,
}

impl SweepResult {
    /// Empty result
    pub fn new(identity: PolicyIdentity, axis: Axis) -> Self {
        Self { identity, axis, entries: Vec::new() }
    }

    /// Append the curve for `value`, labeled the way the axis labels it
    pub fn push(
        &mut self,
        value: ParameterValue,
        hyperparameters: HyperparameterConfig,
        curve: LearningCurve,
        elapsed_secs: f64,
    ) {
        let label = self.axis.label(&value);
        self.entries.push(SweepEntry { value, label, hyperparameters, curve, elapsed_secs });
    }

    /// Policy that was swept
    pub fn identity(&self) -> PolicyIdentity {
        self.identity
    }

    /// Axis that was varied
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Entries in declared order
    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    /// Iterate entries in declared order
    pub fn iter(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter()
    }

    /// Swept values in declared order
    pub fn values(&self) -> Vec<ParameterValue> {
        self.entries.iter().map(|e| e.value).collect()
    }

    /// Curve for `value`, if it was swept
    pub fn get(&self, value: &ParameterValue) -> Option<&LearningCurve> {
        self.entries.iter().find(|e| e.value == *value).map(|e| &e.curve)
    }

    /// Number of evaluated values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no value was evaluated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plot title, e.g. "Dyna: effect of learning rate"
    pub fn title(&self) -> String {
        format!("{}: effect of {}", self.identity, self.axis.description())
    }

    /// Artifact name stem, e.g. "dyna_learning_rate"
    pub fn stem(&self) -> String {
        format!("{}_{}", self.identity.slug(), self.axis.file_stem())
    }

    /// Tabular artifact name for one value
    pub fn csv_name(&self, value: &ParameterValue) -> String {
        format!("{}_{}.csv", self.stem(), value)
    }

    /// Write the CSVs, the plot and the JSON summary of this sweep
    ///
    /// The result itself is untouched, so a failed export never loses curves.
    pub fn export<S: ArtifactSink + ?Sized>(&self, sink: &mut S) -> Result<PlotSummary> {
        let policy = self.identity.name();
        let curves: Vec<ExportedCurve<'_>> = self
            .entries
            .iter()
            .map(|entry| ExportedCurve {
                label: entry.label.clone(),
                csv: self.csv_name(&entry.value),
                policy,
                hyperparameters: entry.hyperparameters,
                curve: &entry.curve,
                elapsed_secs: entry.elapsed_secs,
            })
            .collect();
        export_curves(sink, &self.title(), &self.stem(), &curves)
    }
}

impl<'a> IntoIterator for &'a SweepResult {
    type Item = &'a SweepEntry;
    type IntoIter = std::slice::Iter<'a, SweepEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Evaluate every value of `grid` for `identity`
///
/// The whole grid is validated against `defaults` before the first
/// repetition runs; afterwards values are evaluated strictly in order.
pub fn run_sweep<E, EF>(
    runner: &RepetitionRunner,
    identity: PolicyIdentity,
    defaults: &HyperparameterConfig,
    grid: &AxisGrid,
    make_env: &EF,
) -> Result<SweepResult>
where
    E: Environment,
    EF: Fn(u64) -> Result<E> + Sync,
{
    defaults.validate()?;
    grid.validate(defaults)?;

    let axis = grid.axis();
    tracing::info!("{} effect of {} ({} values)", identity, axis.name(), grid.values().len());

    let mut result = SweepResult::new(identity, axis);
    for value in grid.values() {
        let hyperparameters = axis.apply(defaults, value)?;
        let started = Instant::now();
        let curve = runner.run(identity, &hyperparameters, make_env)?;
        let elapsed_secs = started.elapsed().as_secs_f64();

        tracing::info!(
            "{} {}: mean reward {:.4} ({:.1}s)",
            identity,
            axis.label(value),
            curve.mean(),
            elapsed_secs
        );
        result.push(*value, hyperparameters, curve, elapsed_secs);
    }
    Ok(result)
}
