//! Per-run loss and accuracy series.

use crate::config::{ModelConfig, TrainingConfig};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metrics for a single epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss_train: f32,
    pub acc_train: f32,
    pub loss_val: f32,
    pub acc_val: f32,
    /// Seconds spent drawing and normalizing the training view.
    pub sample_secs: f64,
    pub train_secs: f64,
    pub val_secs: f64,
    /// Per-layer weight norms, empty when the model does not report them.
    #[serde(default)]
    pub weight_norms: Vec<f32>,
    /// Per-layer gradient norms, empty when the model does not report them.
    #[serde(default)]
    pub grad_norms: Vec<f32>,
}

/// Everything recorded over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    pub epochs: Vec<EpochStats>,
    pub loss_test: Option<f32>,
    pub acc_test: Option<f32>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stats: EpochStats) {
        self.epochs.push(stats);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    pub fn loss_train(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.loss_train).collect()
    }

    pub fn loss_val(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.loss_val).collect()
    }

    pub fn acc_train(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.acc_train).collect()
    }

    pub fn acc_val(&self) -> Vec<f32> {
        self.epochs.iter().map(|e| e.acc_val).collect()
    }

    /// Weight norms per epoch, one row per epoch.
    pub fn weight_norms(&self) -> Vec<Vec<f32>> {
        self.epochs.iter().map(|e| e.weight_norms.clone()).collect()
    }

    /// Gradient norms per epoch, one row per epoch.
    pub fn grad_norms(&self) -> Vec<Vec<f32>> {
        self.epochs.iter().map(|e| e.grad_norms.clone()).collect()
    }

    fn has_norms(&self) -> bool {
        self.epochs
            .iter()
            .any(|e| !e.weight_norms.is_empty() || !e.grad_norms.is_empty())
    }

    /// Write one JSON file per series into `dir`, creating it if needed.
    ///
    /// `loss_test.json` and `acc_test.json` hold a single number and are
    /// only written once the test set has been evaluated.
    /// `weight_norms.json` and `grad_norms.json` are written when the model
    /// reported layer norms in at least one epoch.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write_json(dir, "loss_train", &self.loss_train())?;
        write_json(dir, "loss_val", &self.loss_val())?;
        write_json(dir, "acc_train", &self.acc_train())?;
        write_json(dir, "acc_val", &self.acc_val())?;
        if self.has_norms() {
            write_json(dir, "weight_norms", &self.weight_norms())?;
            write_json(dir, "grad_norms", &self.grad_norms())?;
        }
        if let Some(loss) = self.loss_test {
            write_json(dir, "loss_test", &loss)?;
        }
        if let Some(acc) = self.acc_test {
            write_json(dir, "acc_test", &acc)?;
        }
        tracing::debug!(dir = %dir.display(), epochs = self.len(), "saved run history");
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let file = fs::File::create(dir.join(format!("{name}.json")))?;
    serde_json::to_writer(std::io::BufWriter::new(file), value)?;
    Ok(())
}

/// Directory a run's history is saved under, relative to the loss dir.
///
/// `<experiment>/layers_<n>-seed_<seed>` when an experiment name is set,
/// otherwise the checkpoint's run name.
pub fn run_folder(training: &TrainingConfig, model: &ModelConfig, run_name: &str) -> PathBuf {
    match &training.experiment_name {
        Some(experiment) => PathBuf::from(experiment).join(format!(
            "layers_{}-seed_{}",
            model.nbaseblocklayer, training.seed
        )),
        None => PathBuf::from(run_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(epoch: usize, loss: f32) -> EpochStats {
        EpochStats {
            epoch,
            loss_train: loss,
            acc_train: 0.5,
            loss_val: loss + 0.1,
            acc_val: 0.4,
            sample_secs: 0.0,
            train_secs: 0.0,
            val_secs: 0.0,
            weight_norms: Vec::new(),
            grad_norms: Vec::new(),
        }
    }

    #[test]
    fn test_save_series() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = RunHistory::new();
        history.push(stats(0, 1.0));
        history.push(stats(1, 0.5));
        history.acc_test = Some(0.8);

        history.save(dir.path()).unwrap();

        let text = fs::read_to_string(dir.path().join("loss_train.json")).unwrap();
        let loss: Vec<f32> = serde_json::from_str(&text).unwrap();
        assert_eq!(loss, vec![1.0, 0.5]);
        let acc: f32 =
            serde_json::from_str(&fs::read_to_string(dir.path().join("acc_test.json")).unwrap()).unwrap();
        assert_eq!(acc, 0.8);
        assert!(!dir.path().join("loss_test.json").exists());
        assert!(!dir.path().join("weight_norms.json").exists());
    }

    #[test]
    fn test_save_layer_norms() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = RunHistory::new();
        let mut first = stats(0, 1.0);
        first.weight_norms = vec![2.0, 3.0];
        first.grad_norms = vec![0.5, 0.25];
        history.push(first);

        history.save(dir.path()).unwrap();

        let text = fs::read_to_string(dir.path().join("weight_norms.json")).unwrap();
        let weights: Vec<Vec<f32>> = serde_json::from_str(&text).unwrap();
        assert_eq!(weights, vec![vec![2.0, 3.0]]);
        let text = fs::read_to_string(dir.path().join("grad_norms.json")).unwrap();
        let grads: Vec<Vec<f32>> = serde_json::from_str(&text).unwrap();
        assert_eq!(grads, vec![vec![0.5, 0.25]]);
    }

    #[test]
    fn test_run_folder() {
        let model = ModelConfig::default().with_layers(8);
        let plain = TrainingConfig::default();
        assert_eq!(run_folder(&plain, &model, "abc"), PathBuf::from("abc"));

        let named = TrainingConfig::default().with_experiment_name("cora_init").with_seed(7);
        assert_eq!(
            run_folder(&named, &model, "abc"),
            PathBuf::from("cora_init").join("layers_8-seed_7")
        );
    }
}
