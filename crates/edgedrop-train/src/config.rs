//! Run configuration.
//!
//! [`TrainingConfig`] drives the epoch loop; [`ModelConfig`] is the
//! architecture selection handed to whatever builds the model. Both load
//! from JSON and use builder-style `with_*` setters.

use crate::error::{Error, Result};
use edgedrop_core::{Normalization, Split, SplitSizes, TaskType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Random seed for edge sampling (default: 42).
    pub seed: u64,
    /// Number of training epochs (default: 800).
    pub epochs: usize,
    /// Learning rate for the model's optimizer (default: 0.02).
    ///
    /// Not read by the epoch loop; carried so the model builder gets it
    /// from the same config file.
    pub lr: f32,
    /// Weight decay for the model's optimizer (default: 5e-4). Carried
    /// like `lr`.
    pub weight_decay: f32,
    /// Edge retain probability per epoch (default: 1.0, no dropping).
    pub sampling_percent: f64,
    /// Adjacency normalization (default: AugNormAdj).
    pub normalization: Normalization,
    /// Early stopping patience; 0 disables (default: 0).
    pub early_stopping: usize,
    /// Skip per-epoch validation (default: false).
    pub fastmode: bool,
    /// Log every epoch at info level instead of debug.
    pub debug: bool,
    /// Supervision regime for citation datasets (default: full).
    ///
    /// Applied by [`TrainingConfig::citation_split`] when a loader builds
    /// the split; the epoch loop only sees the resulting [`Split`].
    pub task_type: TaskType,
    /// Groups run histories as `<experiment>/layers_<n>-seed_<seed>`.
    pub experiment_name: Option<String>,
    /// Where best-parameter snapshots go (default: `checkpoints`).
    pub checkpoint_dir: PathBuf,
    /// Where run histories go (default: `losses`).
    pub loss_dir: PathBuf,
    /// Checkpoint to load before the first epoch.
    pub warm_start: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            epochs: 800,
            lr: 0.02,
            weight_decay: 5e-4,
            sampling_percent: 1.0,
            normalization: Normalization::AugNormAdj,
            early_stopping: 0,
            fastmode: false,
            debug: false,
            task_type: TaskType::Full,
            experiment_name: None,
            checkpoint_dir: PathBuf::from("checkpoints"),
            loss_dir: PathBuf::from("losses"),
            warm_start: None,
        }
    }
}

impl TrainingConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_sampling_percent(mut self, percent: f64) -> Self {
        self.sampling_percent = percent;
        self
    }

    pub fn with_normalization(mut self, scheme: Normalization) -> Self {
        self.normalization = scheme;
        self
    }

    pub fn with_early_stopping(mut self, patience: usize) -> Self {
        self.early_stopping = patience;
        self
    }

    pub fn with_fastmode(mut self, fastmode: bool) -> Self {
        self.fastmode = fastmode;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = Some(name.into());
        self
    }

    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = dir.into();
        self
    }

    pub fn with_loss_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.loss_dir = dir.into();
        self
    }

    pub fn with_warm_start(mut self, path: impl Into<PathBuf>) -> Self {
        self.warm_start = Some(path.into());
        self
    }

    /// Check ranges and apply setting interactions.
    ///
    /// Fast mode never evaluates the validation set, so early stopping is
    /// switched off there.
    pub fn resolve(mut self) -> Result<Self> {
        if self.sampling_percent.is_nan() || self.sampling_percent < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sampling_percent must be a probability, got {}",
                self.sampling_percent
            )));
        }
        if self.fastmode && self.early_stopping > 0 {
            tracing::warn!(
                patience = self.early_stopping,
                "early stopping is not available in fast mode; disabling it"
            );
            self.early_stopping = 0;
        }
        Ok(self)
    }

    /// Planetoid-style split over the first `sizes.labeled` nodes, cut
    /// according to `task_type`.
    pub fn citation_split(&self, sizes: SplitSizes, test: Vec<usize>) -> Split {
        Split::citation(self.task_type, sizes, test)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// Base building block of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseBlock {
    /// Plain stack of GCN layers.
    MutiGcn,
    /// Residual blocks.
    #[default]
    ResGcn,
    /// Densely connected blocks.
    DenseGcn,
    /// Inception-style blocks with parallel branches.
    InceptionGcn,
}

impl BaseBlock {
    pub fn name(self) -> &'static str {
        match self {
            BaseBlock::MutiGcn => "mutigcn",
            BaseBlock::ResGcn => "resgcn",
            BaseBlock::DenseGcn => "densegcn",
            BaseBlock::InceptionGcn => "inceptiongcn",
        }
    }
}

impl fmt::Display for BaseBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseBlock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mutigcn" => Ok(BaseBlock::MutiGcn),
            "resgcn" => Ok(BaseBlock::ResGcn),
            "densegcn" => Ok(BaseBlock::DenseGcn),
            "inceptiongcn" => Ok(BaseBlock::InceptionGcn),
            other => Err(Error::InvalidConfig(format!("unknown base block: {other}"))),
        }
    }
}

/// How the outputs of stacked layers are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggrMethod {
    /// Resolved from the base block: `add` for resgcn, `concat` otherwise.
    #[default]
    Default,
    Add,
    Concat,
    /// No residual aggregation.
    NoRes,
}

impl FromStr for AggrMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(AggrMethod::Default),
            "add" => Ok(AggrMethod::Add),
            "concat" => Ok(AggrMethod::Concat),
            "nores" => Ok(AggrMethod::NoRes),
            other => Err(Error::InvalidConfig(format!("unknown aggregation: {other}"))),
        }
    }
}

/// Which network family a [`ModelConfig`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelArchitecture {
    /// Base blocks stacked between the input and output layers.
    Gcn,
    /// Like `Gcn`, with every layer's output concatenated into the next.
    SkipGcn,
}

/// Architecture selection for the external model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_block: BaseBlock,
    pub aggr_method: AggrMethod,
    /// Hidden width (default: 128).
    pub hidden: usize,
    /// Dropout rate (default: 0.5).
    pub dropout: f32,
    /// Number of base blocks (default: 1).
    pub nbaseblocklayer: usize,
    /// Hidden layers per block (default: 1).
    pub nhiddenlayer: usize,
    pub with_bn: bool,
    pub with_loop: bool,
    /// Input layer kind (default: `gcn`).
    pub input_layer: String,
    /// Output layer kind (default: `gcn`).
    pub output_layer: String,
    /// Weight initializer by name; `None` keeps the model's own default.
    pub init_func: Option<String>,
    /// Concatenate layer outputs (default: false).
    pub skip_connections: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_block: BaseBlock::ResGcn,
            aggr_method: AggrMethod::Default,
            hidden: 128,
            dropout: 0.5,
            nbaseblocklayer: 1,
            nhiddenlayer: 1,
            with_bn: false,
            with_loop: false,
            input_layer: "gcn".to_string(),
            output_layer: "gcn".to_string(),
            init_func: None,
            skip_connections: false,
        }
    }
}

impl ModelConfig {
    pub fn with_base_block(mut self, block: BaseBlock) -> Self {
        self.base_block = block;
        self
    }

    pub fn with_aggr_method(mut self, method: AggrMethod) -> Self {
        self.aggr_method = method;
        self
    }

    pub fn with_layers(mut self, nbaseblocklayer: usize) -> Self {
        self.nbaseblocklayer = nbaseblocklayer;
        self
    }

    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_input_layer(mut self, layer: impl Into<String>) -> Self {
        self.input_layer = layer.into();
        self
    }

    pub fn with_output_layer(mut self, layer: impl Into<String>) -> Self {
        self.output_layer = layer.into();
        self
    }

    pub fn with_init_func(mut self, name: impl Into<String>) -> Self {
        self.init_func = Some(name.into());
        self
    }

    pub fn with_skip_connections(mut self, skip: bool) -> Self {
        self.skip_connections = skip;
        self
    }

    pub fn architecture(&self) -> ModelArchitecture {
        if self.skip_connections {
            ModelArchitecture::SkipGcn
        } else {
            ModelArchitecture::Gcn
        }
    }

    /// Replace `Default` aggregation with the block's own and pin the
    /// multi-layer GCN to `nores` with a single hidden layer.
    pub fn resolve(mut self) -> Self {
        if self.aggr_method == AggrMethod::Default {
            self.aggr_method = match self.base_block {
                BaseBlock::ResGcn => AggrMethod::Add,
                _ => AggrMethod::Concat,
            };
        }
        if self.base_block == BaseBlock::MutiGcn
            && (self.aggr_method != AggrMethod::NoRes || self.nhiddenlayer != 1)
        {
            tracing::warn!("multi-layer gcn uses nores aggregation and one hidden layer");
            self.aggr_method = AggrMethod::NoRes;
            self.nhiddenlayer = 1;
        }
        self
    }
}
