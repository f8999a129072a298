//! Artifact persistence
//!
//! Sweeps and comparisons hand their curves to an [`ArtifactSink`]: one
//! comma-delimited row per curve, one PNG plot per sweep or comparison, and a
//! JSON summary. Export failures surface as errors carrying a
//! [`HarnessError::Export`] context; curves already computed are returned to
//! the caller regardless of what the sink does with them.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{
    error::HarnessError,
    train::{HyperparameterConfig, LearningCurve},
};

pub mod csv;
pub mod plot;
pub mod summary;

pub use plot::{LearningCurvePlot, PlotSeries};
pub use summary::{CurveSummary, PlotSummary};

/// Destination for named artifacts
pub trait ArtifactSink {
    /// Store raw bytes under `name`
    fn write_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Store one curve as a single comma-delimited row
    fn write_csv(&mut self, name: &str, values: &[f64]) -> Result<()> {
        self.write_bytes(name, csv::format_row(values).as_bytes())
    }

    /// Store a plot as PNG
    fn write_plot(&mut self, name: &str, plot: &LearningCurvePlot) -> Result<()> {
        let png = plot.encode_png()?;
        self.write_bytes(name, &png)
    }

    /// Store a pretty-printed JSON document
    fn write_json(&mut self, name: &str, value: &serde_json::Value) -> Result<()> {
        let json = serde_json::to_vec_pretty(value)?;
        self.write_bytes(name, &json)
    }
}

impl<S: ArtifactSink + ?Sized> ArtifactSink for &mut S {
    fn write_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(name, bytes)
    }
}

/// Writes artifacts as files under a root directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Use `root`, creating it if needed
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).with_context(|| HarnessError::Export { path: root.clone() })?;
        Ok(Self { root })
    }

    /// Output directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of an artifact
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ArtifactSink for DirectorySink {
    fn write_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(name);
        fs::write(&path, bytes).with_context(|| HarnessError::Export { path: path.clone() })?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Keeps artifacts in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `name`
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.artifacts.get(name).map(Vec::as_slice)
    }

    /// Artifact as UTF-8 text
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Stored names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether nothing was stored
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn write_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.artifacts.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// One curve handed to [`export_curves`]
#[derive(Debug, Clone)]
pub struct ExportedCurve<'a> {
    /// Legend label
    pub label: String,
    /// Artifact name of the tabular export
    pub csv: String,
    /// Policy name
    pub policy: &'a str,
    /// Configuration the curve was produced with
    pub hyperparameters: HyperparameterConfig,
    /// The curve itself
    pub curve: &'a LearningCurve,
    /// Wall-clock seconds spent producing it
    pub elapsed_secs: f64,
}

/// Write one CSV per curve, a plot `<stem>.png` and a summary `<stem>.json`
///
/// Curves keep their order in the plot legend and in the summary.
pub fn export_curves<S>(sink: &mut S, title: &str, stem: &str, curves: &[ExportedCurve<'_>]) -> Result<PlotSummary>
where
    S: ArtifactSink + ?Sized,
{
    let mut plot = LearningCurvePlot::new(title);
    let mut summaries = Vec::with_capacity(curves.len());

    for exported in curves {
        sink.write_csv(&exported.csv, exported.curve.values())?;
        plot.add_curve(exported.curve.values(), exported.label.clone());
        summaries.push(
            CurveSummary::new(
                exported.label.clone(),
                exported.policy,
                exported.hyperparameters,
                exported.curve,
                exported.elapsed_secs,
            )
            .with_csv(exported.csv.clone()),
        );
    }

    let plot_name = format!("{}.png", stem);
    sink.write_plot(&plot_name, &plot)?;

    let first = curves.first().map(|c| c.curve);
    let summary = PlotSummary {
        title: title.to_string(),
        plot: plot_name,
        n_timesteps: first.map_or(0, |c| c.len()),
        n_repetitions: first.map_or(0, |c| c.n_repetitions()),
        smoothing_window: first.map_or(0, |c| c.smoothing_window()),
        elapsed_secs: curves.iter().map(|c| c.elapsed_secs).sum(),
        curves: summaries,
    };
    sink.write_json(&format!("{}.json", stem), &serde_json::to_value(&summary)?)?;

    tracing::info!("Saved {} ({} curves)", summary.plot, curves.len());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::harness_error, train::RewardTrace};

    #[test]
    fn test_export_curves_writes_every_artifact() {
        let curve = LearningCurve::from_traces(&[RewardTrace::new(vec![1.0, 2.0, 3.0])], 1).unwrap();
        let curves = vec![
            ExportedCurve {
                label: "a".to_string(),
                csv: "stem_a.csv".to_string(),
                policy: "Dyna",
                hyperparameters: HyperparameterConfig::default(),
                curve: &curve,
                elapsed_secs: 0.5,
            },
            ExportedCurve {
                label: "b".to_string(),
                csv: "stem_b.csv".to_string(),
                policy: "Dyna",
                hyperparameters: HyperparameterConfig::default().planning_budget(0),
                curve: &curve,
                elapsed_secs: 0.25,
            },
        ];

        let mut sink = MemorySink::new();
        let summary = export_curves(&mut sink, "Title", "stem", &curves).unwrap();

        assert_eq!(sink.names().collect::<Vec<_>>(), vec!["stem.json", "stem.png", "stem_a.csv", "stem_b.csv"]);
        assert_eq!(sink.text("stem_a.csv"), Some("1,2,3\n"));
        assert_eq!(summary.curves[1].label, "b");
        assert_eq!(summary.curves[1].hyperparameters.planning_budget, 0);
        assert_eq!(summary.n_timesteps, 3);
        assert_eq!(summary.elapsed_secs, 0.75);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::create(dir.path().join("nested/out")).unwrap();

        sink.write_csv("curve.csv", &[1.0, 2.5]).unwrap();
        sink.write_json("summary.json", &serde_json::json!({ "title": "t" })).unwrap();

        let row = fs::read_to_string(sink.path("curve.csv")).unwrap();
        assert_eq!(row, "1,2.5\n");
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(sink.path("summary.json")).unwrap()).unwrap();
        assert_eq!(json["title"], "t");
    }

    #[test]
    fn test_export_failure_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::create(dir.path()).unwrap();

        // A directory in the way of the file
        fs::create_dir(sink.path("blocked.csv")).unwrap();
        let err = sink.write_csv("blocked.csv", &[1.0]).unwrap_err();

        assert_eq!(
            harness_error(&err),
            Some(&HarnessError::Export { path: sink.path("blocked.csv") })
        );
    }

    #[test]
    fn test_memory_sink_through_mut_reference() {
        let mut sink = MemorySink::new();
        {
            let mut by_ref = &mut sink;
            ArtifactSink::write_csv(&mut by_ref, "a.csv", &[0.5]).unwrap();
        }
        assert_eq!(sink.text("a.csv"), Some("0.5\n"));
        assert_eq!(sink.names().collect::<Vec<_>>(), vec!["a.csv"]);
    }
}
