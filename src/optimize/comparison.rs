//! Comparison runner
//!
//! Evaluates a small, explicit set of configurations side by side: the
//! selected configuration of every policy, or one policy with and without
//! planning.

use std::{fmt, time::Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::selector::Selections;
use crate::{
    artifact::{ArtifactSink, ExportedCurve, PlotSummary, export_curves},
    env::Environment,
    policy::PolicyIdentity,
    train::{HyperparameterConfig, LearningCurve, RepetitionRunner},
};

/// Planning arm of a baseline-versus-planning comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningVariant {
    /// No simulated updates: plain model-free learning
    Baseline,
    /// The full configured planning budget
    FullPlanning,
}

impl PlanningVariant {
    /// Both arms, baseline first
    pub const ALL: [PlanningVariant; 2] = [PlanningVariant::Baseline, PlanningVariant::FullPlanning];

    /// Planning budget this arm runs with
    pub fn planning_budget(&self, full_budget: usize) -> usize {
        match self {
            PlanningVariant::Baseline => 0,
            PlanningVariant::FullPlanning => full_budget,
        }
    }

    /// Legend label
    pub fn label(&self, full_budget: usize) -> String {
        match self {
            PlanningVariant::Baseline => "Baseline (no planning)".to_string(),
            PlanningVariant::FullPlanning => format!("Full planning ({} updates)", full_budget),
        }
    }

    /// File-name friendly key
    pub fn key(&self) -> &'static str {
        match self {
            PlanningVariant::Baseline => "baseline",
            PlanningVariant::FullPlanning => "full_planning",
        }
    }
}

impl fmt::Display for PlanningVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One configuration in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    /// File-name friendly key, unique within the plan
    pub key: String,
    /// Legend label
    pub label: String,
    /// Policy to evaluate
    pub identity: PolicyIdentity,
    /// Configuration to evaluate it with
    pub hyperparameters: HyperparameterConfig,
}

/// Configurations to evaluate side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPlan {
    title: String,
    stem: String,
    entries: Vec<ComparisonEntry>,
}

impl ComparisonPlan {
    /// Empty plan; `stem` names the plot and the per-entry files
    pub fn new(title: impl Into<String>, stem: impl Into<String>) -> Self {
        Self { title: title.into(), stem: stem.into(), entries: Vec::new() }
    }

    /// Add one configuration
    pub fn with_entry(mut self, entry: ComparisonEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Each policy with its selected values applied to `defaults`
    pub fn selected(
        policies: &[PolicyIdentity],
        selections: &Selections,
        defaults: &HyperparameterConfig,
    ) -> Result<Self> {
        let mut plan = Self::new("Comparison of selected configurations", "comparison_selected");
        for &identity in policies {
            plan = plan.with_entry(ComparisonEntry {
                key: identity.slug().to_string(),
                label: identity.name().to_string(),
                identity,
                hyperparameters: selections.apply_to(identity, defaults)?,
            });
        }
        Ok(plan)
    }

    /// `identity` without planning against `full_budget` planning updates
    pub fn planning(identity: PolicyIdentity, hyperparameters: &HyperparameterConfig, full_budget: usize) -> Self {
        let title = format!("{}: baseline vs full planning", identity);
        let stem = format!("{}_planning", identity.slug());
        PlanningVariant::ALL.iter().fold(Self::new(title, stem), |plan, variant| {
            plan.with_entry(ComparisonEntry {
                key: variant.key().to_string(),
                label: variant.label(full_budget),
                identity,
                hyperparameters: hyperparameters.planning_budget(variant.planning_budget(full_budget)),
            })
        })
    }

    /// Plot title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Artifact name stem
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Entries in evaluation order
    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }
}

/// Curve produced for one comparison entry
#[derive(Debug, Clone, PartialEq)]
pub struct ComparedCurve {
    /// Entry that produced it
    pub entry: ComparisonEntry,
    /// Resulting learning curve
    pub curve: LearningCurve,
    /// Wall-clock seconds spent on it
    pub elapsed_secs: f64,
}

/// Labeled curves of a finished comparison
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    title: String,
    stem: String,
    curves: Vec<ComparedCurve>,
}

impl ComparisonResult {
    /// Plot title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Artifact name stem
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Curves in plan order
    pub fn curves(&self) -> &[ComparedCurve] {
        &self.curves
    }

    /// Curve of the entry with `key`
    pub fn get(&self, key: &str) -> Option<&LearningCurve> {
        self.curves.iter().find(|c| c.entry.key == key).map(|c| &c.curve)
    }

    /// Write the CSVs, the plot and the JSON summary
    pub fn export<S: ArtifactSink + ?Sized>(&self, sink: &mut S) -> Result<PlotSummary> {
        let curves: Vec<ExportedCurve<'_>> = self
            .curves
            .iter()
            .map(|compared| ExportedCurve {
                label: compared.entry.label.clone(),
                csv: format!("{}_{}.csv", self.stem, compared.entry.key),
                policy: compared.entry.identity.name(),
                hyperparameters: compared.entry.hyperparameters,
                curve: &compared.curve,
                elapsed_secs: compared.elapsed_secs,
            })
            .collect();
        export_curves(sink, &self.title, &self.stem, &curves)
    }
}

/// Evaluate every entry of `plan` once
///
/// All configurations are validated before the first repetition runs.
pub fn run_comparison<E, EF>(
    runner: &RepetitionRunner,
    plan: &ComparisonPlan,
    make_env: &EF,
) -> Result<ComparisonResult>
where
    E: Environment,
    EF: Fn(u64) -> Result<E> + Sync,
{
    for entry in &plan.entries {
        entry.hyperparameters.validate()?;
    }

    tracing::info!("{} ({} configurations)", plan.title, plan.entries.len());

    let mut curves = Vec::with_capacity(plan.entries.len());
    for entry in &plan.entries {
        let started = Instant::now();
        let curve = runner.run(entry.identity, &entry.hyperparameters, make_env)?;
        let elapsed_secs = started.elapsed().as_secs_f64();

        tracing::info!("{}: mean reward {:.4} ({:.1}s)", entry.label, curve.mean(), elapsed_secs);
        curves.push(ComparedCurve { entry: entry.clone(), curve, elapsed_secs });
    }

    Ok(ComparisonResult { title: plan.title.clone(), stem: plan.stem.clone(), curves })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        artifact::MemorySink,
        env::WindyGridworld,
        optimize::{
            selector::{SelectionBasis, SelectionOutcome},
            space::{Axis, ParameterValue},
        },
        train::RunSettings,
    };

    fn runner() -> RepetitionRunner {
        let settings = RunSettings::new().n_repetitions(2).n_timesteps(120).smoothing_window(9).seed(Some(11));
        RepetitionRunner::new(settings).unwrap()
    }

    #[test]
    fn test_planning_variants_map_to_budgets() {
        assert_eq!(PlanningVariant::Baseline.planning_budget(15), 0);
        assert_eq!(PlanningVariant::FullPlanning.planning_budget(15), 15);

        let plan = ComparisonPlan::planning(PolicyIdentity::Dyna, &HyperparameterConfig::default(), 15);
        let budgets: Vec<usize> = plan.entries().iter().map(|e| e.hyperparameters.planning_budget).collect();
        assert_eq!(budgets, vec![0, 15]);
        assert_eq!(plan.stem(), "dyna_planning");
    }

    #[test]
    fn test_selected_plan_applies_selections() {
        let mut selections = Selections::new();
        selections.insert(SelectionOutcome {
            policy: PolicyIdentity::PrioritizedSweeping,
            axis: Axis::ExplorationRate,
            value: ParameterValue::Continuous(0.1),
            score: 1.0,
            basis: SelectionBasis::Smoothed,
        });

        let plan =
            ComparisonPlan::selected(&PolicyIdentity::ALL, &selections, &HyperparameterConfig::default()).unwrap();

        assert_eq!(plan.entries().len(), 2);
        assert_eq!(plan.entries()[0].hyperparameters.exploration_rate, 0.05);
        assert_eq!(plan.entries()[1].hyperparameters.exploration_rate, 0.1);
        assert_eq!(plan.entries()[1].label, "Prioritized Sweeping");
    }

    #[test]
    fn test_run_and_export_comparison() {
        let plan = ComparisonPlan::planning(PolicyIdentity::Dyna, &HyperparameterConfig::default(), 5);
        let result = run_comparison(&runner(), &plan, &|seed: u64| Ok(WindyGridworld::new(seed))).unwrap();

        assert_eq!(result.curves().len(), 2);
        assert_eq!(result.get("baseline").map(LearningCurve::len), Some(120));

        let mut sink = MemorySink::new();
        let summary = result.export(&mut sink).unwrap();
        assert_eq!(summary.plot, "dyna_planning.png");
        assert!(sink.get("dyna_planning_baseline.csv").is_some());
        assert!(sink.get("dyna_planning_full_planning.csv").is_some());
        assert_eq!(summary.curves[1].label, "Full planning (5 updates)");
    }

    #[test]
    fn test_invalid_entry_fails_before_running() {
        let plan = ComparisonPlan::new("bad", "bad").with_entry(ComparisonEntry {
            key: "x".to_string(),
            label: "x".to_string(),
            identity: PolicyIdentity::Dyna,
            hyperparameters: HyperparameterConfig::default().discount(1.5),
        });
        let built = AtomicUsize::new(0);
        let make_env = |seed: u64| -> Result<WindyGridworld> {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(WindyGridworld::new(seed))
        };

        assert!(run_comparison(&runner(), &plan, &make_env).is_err());
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }
}
