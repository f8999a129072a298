//! A small study written to a temporary directory

use std::fs;

use anyhow::Result;
use mbrl_harness::{
    artifact::DirectorySink,
    config::{ExperimentConfig, load_or_init},
    env::WindyGridworld,
    optimize::{Axis, SelectionOutcome, Study, StudyReport},
    policy::PolicyIdentity,
};

fn tiny_config() -> ExperimentConfig {
    ExperimentConfig {
        n_timesteps: 150,
        n_repetitions: 2,
        smoothing_window: 15,
        seed: Some(2021),
        exploration_rates: vec![0.05, 0.1],
        learning_rates: vec![0.1, 1.0],
        planning_budgets: vec![1, 5],
        full_planning_budget: 5,
        ..ExperimentConfig::default()
    }
}

#[test]
fn test_study_writes_all_artifacts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("experiment.json");
    let config = load_or_init(&config_path, tiny_config)?;

    let mut sink = DirectorySink::create(dir.path().join("results"))?;
    let report = Study::new(config)?.run(|seed| Ok(WindyGridworld::new(seed)), &mut sink)?;

    for policy in ["dyna", "prioritized_sweeping"] {
        for axis in ["egreedy", "n_planning_updates", "learning_rate"] {
            assert!(sink.path(&format!("{}_{}.png", policy, axis)).is_file());
            assert!(sink.path(&format!("{}_{}.json", policy, axis)).is_file());
        }
        assert!(sink.path(&format!("{}_planning.png", policy)).is_file());
        assert!(sink.path(&format!("{}_planning_baseline.csv", policy)).is_file());
    }
    assert!(sink.path("comparison_selected.png").is_file());
    assert!(sink.path("dyna_egreedy_0.05.csv").is_file());

    let selections: serde_json::Value = serde_json::from_str(&fs::read_to_string(sink.path("selections.json"))?)?;
    let outcomes: Vec<SelectionOutcome> = serde_json::from_value(selections["outcomes"].clone())?;
    assert_eq!(outcomes.len(), 6);
    assert_eq!(outcomes, report.selections.iter().cloned().collect::<Vec<_>>());

    let chosen = report.selections.get(PolicyIdentity::Dyna, Axis::LearningRate).map(|o| o.value.as_f64());
    assert!(matches!(chosen, Some(v) if v == 0.1 || v == 1.0));
    Ok(())
}

#[test]
fn test_same_seed_same_study() -> Result<()> {
    let mut config = tiny_config();
    config.policies = vec![PolicyIdentity::PrioritizedSweeping];
    config.toggles.compare_selected = false;

    let run = |config: ExperimentConfig| -> Result<_> {
        let dir = tempfile::tempdir()?;
        let mut sink = DirectorySink::create(dir.path())?;
        Ok(Study::new(config)?.run(|seed| Ok(WindyGridworld::new(seed)), &mut sink)?)
    };

    let first = run(config.clone())?;
    let second = run(config)?;
    // Elapsed times differ between runs; the curves must not
    let curves = |report: &StudyReport| {
        report.sweeps.iter().flat_map(|s| s.iter().map(|e| e.curve.clone())).collect::<Vec<_>>()
    };
    assert_eq!(curves(&first), curves(&second));
    assert_eq!(first.selections, second.selections);
    Ok(())
}
