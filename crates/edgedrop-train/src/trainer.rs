//! The epoch loop.
//!
//! Each epoch:
//! 1. Draw a fresh training view (edges dropped with `1 - sampling_percent`)
//! 2. Fetch the cached validation view
//! 3. One optimization step on the training targets
//! 4. Score the validation set (skipped in fast mode)
//! 5. Feed the validation loss to early stopping
//!
//! After the last epoch (or an early stop) the best parameters are restored
//! and the test view is scored once.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgedrop_train::{JsonCheckpointStore, Trainer, TrainingConfig};
//!
//! let config = TrainingConfig::default()
//!     .with_epochs(400)
//!     .with_sampling_percent(0.7)
//!     .with_early_stopping(100);
//! let store = JsonCheckpointStore::new(&config.checkpoint_dir, "cora-resgcn");
//! let mut trainer = Trainer::new(config, store)?;
//! let history = trainer.run(&mut model, &mut sampler)?;
//! println!("test accuracy {:?}", history.acc_test);
//! ```

use crate::checkpoint::CheckpointStore;
use crate::config::TrainingConfig;
use crate::early_stopping::EarlyStoppingController;
use crate::error::Result;
use crate::history::{EpochStats, RunHistory};
use crate::metrics::{self, accuracy, nll_loss, Targets};
use crate::model::Model;
use edgedrop_core::{LearningType, Normalizer, Sampler};
use std::time::Instant;

/// Training, validation and test targets for a sampler's split.
#[derive(Debug, Clone)]
pub struct SplitTargets {
    pub train: Targets,
    pub val: Targets,
    pub test: Targets,
}

impl SplitTargets {
    /// Targets for the sampler's split.
    ///
    /// Transductive training scores rows `train_idx` of the shared graph.
    /// Inductive training scores every row of the training graph, whose
    /// node `k` carries `labels[train_idx[k]]`.
    pub fn for_sampler<N: Normalizer>(sampler: &Sampler<N>) -> Result<Self> {
        let split = sampler.label_and_split_view();
        let train = match sampler.learning_type() {
            LearningType::Transductive => Targets::select(split.train, split.labels)?,
            LearningType::Inductive => Targets::new(
                (0..split.train.len()).collect(),
                metrics::gather(split.labels, split.train, "train label")?,
            )?,
        };
        Ok(Self {
            train,
            val: Targets::select(split.val, split.labels)?,
            test: Targets::select(split.test, split.labels)?,
        })
    }
}

/// Drives a [`Model`] through the epoch loop.
#[derive(Debug)]
pub struct Trainer<S> {
    config: TrainingConfig,
    early_stopping: EarlyStoppingController<S>,
}

impl<S> Trainer<S> {
    /// New trainer; the config is resolved first.
    pub fn new(config: TrainingConfig, store: S) -> Result<Self> {
        let config = config.resolve()?;
        let early_stopping = EarlyStoppingController::new(config.early_stopping, store);
        Ok(Self {
            config,
            early_stopping,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn early_stopping(&self) -> &EarlyStoppingController<S> {
        &self.early_stopping
    }

    /// Train `model` on views drawn from `sampler`, then score the test set.
    pub fn run<M, N>(&mut self, model: &mut M, sampler: &mut Sampler<N>) -> Result<RunHistory>
    where
        M: Model,
        N: Normalizer,
        S: CheckpointStore<M::Params>,
    {
        let scheme = self.config.normalization;
        let percent = self.config.sampling_percent;
        let targets = SplitTargets::for_sampler(sampler)?;

        if let Some(path) = &self.config.warm_start {
            tracing::info!(path = %path.display(), "restoring checkpoint");
            model.load_params(self.early_stopping.load_from(path)?);
        }

        tracing::info!(
            epochs = self.config.epochs,
            sampling_percent = percent,
            normalization = %scheme,
            patience = self.config.early_stopping,
            learning_type = ?sampler.learning_type(),
            "training started"
        );

        let t_total = Instant::now();
        let mut history = RunHistory::new();

        for epoch in 0..self.config.epochs {
            let t = Instant::now();
            let train_view = sampler.training_view(percent, scheme)?;
            let sample_secs = t.elapsed().as_secs_f64();
            let val_view = sampler.validation_view(scheme);

            let t = Instant::now();
            let output = model.train_step(&train_view.features, &train_view.operator, &targets.train)?;
            let loss_train = nll_loss(&output, &targets.train)?;
            let acc_train = accuracy(&output, &targets.train)?;
            let (weight_norms, grad_norms) = model.layer_norms().unwrap_or_default();
            let train_secs = t.elapsed().as_secs_f64();

            let t = Instant::now();
            let (loss_val, acc_val) = if self.config.fastmode {
                (0.0, 0.0)
            } else {
                let output = model.predict(&val_view.features, &val_view.operator)?;
                (nll_loss(&output, &targets.val)?, accuracy(&output, &targets.val)?)
            };
            self.early_stopping
                .observe_with(loss_val, || model.params())?;
            let val_secs = t.elapsed().as_secs_f64();

            let stats = EpochStats {
                epoch,
                loss_train,
                acc_train,
                loss_val,
                acc_val,
                sample_secs,
                train_secs,
                val_secs,
                weight_norms,
                grad_norms,
            };
            log_epoch(&stats, self.config.debug);
            history.push(stats);

            if self.early_stopping.should_stop() {
                tracing::info!(epoch = epoch + 1, "stopping early");
                break;
            }
        }

        if self.early_stopping.best_location().is_some() {
            model.load_params(self.early_stopping.restore()?);
        }
        tracing::info!(
            epochs = history.len(),
            secs = t_total.elapsed().as_secs_f64(),
            "optimization finished"
        );

        let test_view = sampler.test_view(scheme);
        let output = model.predict(&test_view.features, &test_view.operator)?;
        let loss_test = nll_loss(&output, &targets.test)?;
        let acc_test = accuracy(&output, &targets.test)?;
        history.loss_test = Some(loss_test);
        history.acc_test = Some(acc_test);

        if let Some(last) = history.last() {
            tracing::info!(
                loss_train = last.loss_train,
                loss_val = last.loss_val,
                loss_test,
                acc_train = last.acc_train,
                acc_val = last.acc_val,
                acc_test,
                "test set results"
            );
        }
        Ok(history)
    }
}

fn log_epoch(stats: &EpochStats, verbose: bool) {
    macro_rules! epoch_event {
        ($level:ident) => {
            tracing::$level!(
                epoch = stats.epoch + 1,
                loss_train = stats.loss_train,
                acc_train = stats.acc_train,
                loss_val = stats.loss_val,
                acc_val = stats.acc_val,
                s_time = stats.sample_secs,
                t_time = stats.train_secs,
                v_time = stats.val_secs,
                "epoch"
            )
        };
    }
    if verbose {
        epoch_event!(info);
    } else {
        epoch_event!(debug);
    }
}
