//! Test accuracy summaries across runs.
//!
//! Runs are expected under `<loss_dir>/<dataset>_<init>/layers_<n>-.../`,
//! each holding an `acc_test.json` written by [`RunHistory::save`]. One
//! table per aggregate, rows are layer counts and columns `dataset_init`.
//!
//! [`RunHistory::save`]: crate::RunHistory::save

use crate::error::Result;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Statistic computed over the runs in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Max,
    Average,
    Median,
    /// Population standard deviation.
    Std,
}

impl Aggregate {
    pub const ALL: [Aggregate; 4] = [Aggregate::Max, Aggregate::Average, Aggregate::Median, Aggregate::Std];

    pub fn label(self) -> &'static str {
        match self {
            Aggregate::Max => "Max:",
            Aggregate::Average => "Average:",
            Aggregate::Median => "Median:",
            Aggregate::Std => "Std:",
        }
    }

    /// `None` for an empty sample.
    pub fn compute(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        Some(match self {
            Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregate::Average => mean,
            Aggregate::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Aggregate::Std => (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt(),
        })
    }
}

/// Test accuracies gathered per (layer count, dataset_init).
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyReport {
    layers: Vec<usize>,
    columns: Vec<String>,
    /// `samples[row][col]`, row per layer count.
    samples: Vec<Vec<Vec<f64>>>,
}

impl AccuracyReport {
    /// Read every matching `acc_test.json` under `loss_dir`.
    ///
    /// Missing directories contribute no samples.
    pub fn collect(
        loss_dir: impl AsRef<Path>,
        datasets: &[String],
        inits: &[String],
        layers: &[usize],
    ) -> Result<Self> {
        let loss_dir = loss_dir.as_ref();
        let columns: Vec<String> = datasets
            .iter()
            .flat_map(|d| inits.iter().map(move |i| format!("{d}_{i}")))
            .collect();

        let mut samples = Vec::with_capacity(layers.len());
        for &layer in layers {
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let mut values = Vec::new();
                for path in accuracy_paths(&loss_dir.join(column), layer)? {
                    let text = fs::read_to_string(&path)?;
                    values.push(serde_json::from_str::<f64>(&text)?);
                }
                tracing::debug!(column = %column, layer, runs = values.len(), "collected accuracies");
                row.push(values);
            }
            samples.push(row);
        }

        Ok(Self {
            layers: layers.to_vec(),
            columns,
            samples,
        })
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Accuracies recorded for one cell.
    pub fn samples(&self, row: usize, col: usize) -> &[f64] {
        &self.samples[row][col]
    }

    /// One aggregate table, `[row][col]`.
    pub fn table(&self, aggregate: Aggregate) -> Vec<Vec<Option<f64>>> {
        self.samples
            .iter()
            .map(|row| row.iter().map(|cell| aggregate.compute(cell)).collect())
            .collect()
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.columns.iter().map(String::len).max().unwrap_or(0).max(8);
        for aggregate in Aggregate::ALL {
            writeln!(f, "{}", aggregate.label())?;
            write!(f, "{:>6}", "")?;
            for column in &self.columns {
                write!(f, "  {:>width$}", column)?;
            }
            writeln!(f)?;
            for (layer, row) in self.layers.iter().zip(self.table(aggregate)) {
                write!(f, "{:>6}", layer)?;
                for cell in row {
                    match cell {
                        Some(v) => write!(f, "  {:>width$.6}", v)?,
                        None => write!(f, "  {:>width$}", "NaN")?,
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// `acc_test.json` files of runs for `layer` under `dir`.
///
/// A run directory matches when it is named `layers_<layer>` or starts
/// with `layers_<layer>-`, so `layers_1` does not pick up `layers_16`.
fn accuracy_paths(dir: &Path, layer: usize) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let exact = format!("layers_{layer}");
    let prefix = format!("layers_{layer}-");
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name != exact && !name.starts_with(&prefix) {
            continue;
        }
        let path = entry.path().join("acc_test.json");
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_run(root: &Path, column: &str, run: &str, acc: f64) {
        let dir = root.join(column).join(run);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("acc_test.json"), acc.to_string()).unwrap();
    }

    #[test]
    fn test_aggregates() {
        let values = [0.8, 0.6, 0.7, 0.9];
        assert_eq!(Aggregate::Max.compute(&values), Some(0.9));
        assert!((Aggregate::Average.compute(&values).unwrap() - 0.75).abs() < 1e-12);
        assert!((Aggregate::Median.compute(&values).unwrap() - 0.75).abs() < 1e-12);
        let std = Aggregate::Std.compute(&values).unwrap();
        assert!((std - 0.0125f64.sqrt()).abs() < 1e-12);
        assert_eq!(Aggregate::Median.compute(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(Aggregate::Average.compute(&[]), None);
    }

    #[test]
    fn test_collect() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "cora_init", "layers_2-seed_1", 0.80);
        write_run(dir.path(), "cora_init", "layers_2-seed_2", 0.84);
        write_run(dir.path(), "cora_init", "layers_16-seed_1", 0.30);
        write_run(dir.path(), "cora_no_init", "layers_16-seed_1", 0.50);

        let report = AccuracyReport::collect(
            dir.path(),
            &["cora".to_string()],
            &["init".to_string(), "no_init".to_string()],
            &[2, 16],
        )
        .unwrap();

        assert_eq!(report.columns(), ["cora_init", "cora_no_init"]);
        assert_eq!(report.samples(0, 0).len(), 2);
        assert!(report.samples(0, 1).is_empty());

        let max = report.table(Aggregate::Max);
        assert_eq!(max[0][0], Some(0.84));
        assert_eq!(max[0][1], None);
        assert_eq!(max[1][0], Some(0.30));
        assert_eq!(max[1][1], Some(0.50));
    }

    #[test]
    fn test_layer_prefix_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "cora_init", "layers_1-seed_1", 0.7);
        write_run(dir.path(), "cora_init", "layers_16-seed_1", 0.2);
        let report =
            AccuracyReport::collect(dir.path(), &["cora".into()], &["init".into()], &[1]).unwrap();
        assert_eq!(report.samples(0, 0), &[0.7]);
    }

    #[test]
    fn test_display() {
        let dir = tempfile::tempdir().unwrap();
        write_run(dir.path(), "pubmed_init", "layers_4", 0.75);
        let report =
            AccuracyReport::collect(dir.path(), &["pubmed".into()], &["init".into()], &[4]).unwrap();
        let text = report.to_string();
        assert!(text.starts_with("Max:"));
        assert!(text.contains("pubmed_init"));
        assert!(text.contains("0.750000"));
        assert!(text.contains("Std:"));
    }
}
