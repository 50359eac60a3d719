// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]

//! Training-side plumbing for edge-dropping GCN runs.
//!
//! The network itself is external: anything implementing [`Model`] can be
//! trained. This crate supplies the loop around it.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`early_stopping`] | Patience state machine and checkpointing controller |
//! | [`checkpoint`] | Where parameter snapshots are persisted |
//! | [`config`] | Training and architecture settings |
//! | [`metrics`] | NLL loss and accuracy over selected rows |
//! | [`trainer`] | Epoch loop over an `edgedrop_core::Sampler` |
//! | [`history`] | Per-epoch series, saved as JSON |
//! | [`report`] | Max/mean/median/std of test accuracy across runs |

pub mod checkpoint;
pub mod config;
pub mod early_stopping;
mod error;
pub mod history;
pub mod metrics;
mod model;
pub mod report;
pub mod trainer;

pub use checkpoint::{CheckpointStore, JsonCheckpointStore, MemoryCheckpointStore};
pub use config::{AggrMethod, BaseBlock, ModelArchitecture, ModelConfig, TrainingConfig};
pub use early_stopping::{Decision, EarlyStopping, EarlyStoppingController, State};
pub use error::{Error, Result};
pub use history::{run_folder, EpochStats, RunHistory};
pub use metrics::Targets;
pub use model::Model;
pub use report::{AccuracyReport, Aggregate};
pub use trainer::{SplitTargets, Trainer};
