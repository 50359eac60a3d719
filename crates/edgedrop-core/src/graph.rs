use crate::{Error, Result, SparseAdj};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A node-classification graph: adjacency, node features and labels.
///
/// Validated on construction and immutable afterwards; features are held
/// behind an `Arc` so every view can alias them.
///
/// # Example
///
/// ```rust
/// use edgedrop_core::{Graph, SparseAdj};
/// use ndarray::Array2;
///
/// let adj = SparseAdj::from_edges(3, &[(0, 1), (1, 2)]).unwrap().symmetrize();
/// let features = Array2::<f32>::ones((3, 4));
/// let graph = Graph::new(adj, features, vec![0, 1, 0]).unwrap();
///
/// assert_eq!(graph.num_nodes(), 3);
/// assert_eq!(graph.num_features(), 4);
/// assert_eq!(graph.num_classes(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Graph {
    adjacency: SparseAdj,
    features: Arc<Array2<f32>>,
    labels: Vec<usize>,
}

impl Graph {
    /// Build a graph, checking that all three parts agree on the node count
    /// and that no feature row is entirely NaN.
    pub fn new(adjacency: SparseAdj, features: Array2<f32>, labels: Vec<usize>) -> Result<Self> {
        let n = adjacency.num_nodes();
        if features.nrows() != n {
            return Err(Error::ShapeMismatch {
                what: "feature rows",
                expected: n,
                got: features.nrows(),
            });
        }
        if labels.len() != n {
            return Err(Error::ShapeMismatch {
                what: "labels",
                expected: n,
                got: labels.len(),
            });
        }
        if features.ncols() > 0 {
            if let Some(row) = features
                .rows()
                .into_iter()
                .position(|r| r.iter().all(|v| v.is_nan()))
            {
                return Err(Error::UndefinedFeatures { row });
            }
        }

        Ok(Self {
            adjacency,
            features: Arc::new(features),
            labels,
        })
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.adjacency.num_nodes()
    }

    /// Feature dimension.
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// `max(label) + 1`, or 0 for an empty graph.
    pub fn num_classes(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }

    /// Raw adjacency.
    pub fn adjacency(&self) -> &SparseAdj {
        &self.adjacency
    }

    /// Shared feature matrix.
    pub fn features(&self) -> &Arc<Array2<f32>> {
        &self.features
    }

    /// Node labels.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Scale every feature row to sum to 1. All-zero rows stay zero.
    pub fn row_normalize_features(self) -> Self {
        let mut features = Arc::try_unwrap(self.features).unwrap_or_else(|shared| (*shared).clone());
        for mut row in features.rows_mut() {
            let sum: f32 = row.sum();
            if sum != 0.0 && sum.is_finite() {
                row.mapv_inplace(|v| v / sum);
            }
        }
        Self {
            adjacency: self.adjacency,
            features: Arc::new(features),
            labels: self.labels,
        }
    }
}

/// Supervision regime for citation datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Large disjoint splits: every labeled node except the validation block trains.
    #[default]
    Full,
    /// Small training split (e.g. 20 nodes per class).
    Semi,
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "full" => Ok(TaskType::Full),
            "semi" => Ok(TaskType::Semi),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

/// Sizes a citation loader reports alongside its test indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSizes {
    /// Number of labeled nodes available for training and validation.
    pub labeled: usize,
    /// Training nodes in the semi-supervised setting.
    pub semi_train: usize,
    /// Validation block size (500 for the Planetoid splits).
    pub val: usize,
}

impl Default for SplitSizes {
    fn default() -> Self {
        Self {
            labeled: 0,
            semi_train: 140,
            val: 500,
        }
    }
}

/// Train/validation/test node indices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    pub fn new(train: Vec<usize>, val: Vec<usize>, test: Vec<usize>) -> Self {
        Self { train, val, test }
    }

    /// The Planetoid split convention.
    ///
    /// - `Full`: train = `[0, labeled - val)`, val = `[labeled - val, labeled)`
    /// - `Semi`: train = `[0, semi_train)`, val = `[semi_train, semi_train + val)`
    ///
    /// Test indices come from the loader unchanged.
    pub fn citation(task: TaskType, sizes: SplitSizes, test: Vec<usize>) -> Self {
        let (train, val) = match task {
            TaskType::Full => {
                let cut = sizes.labeled.saturating_sub(sizes.val);
                (0..cut, cut..sizes.labeled)
            }
            TaskType::Semi => (0..sizes.semi_train, sizes.semi_train..sizes.semi_train + sizes.val),
        };
        Self {
            train: train.collect(),
            val: val.collect(),
            test,
        }
    }

    fn check(indices: &[usize], what: &'static str, len: usize) -> Result<()> {
        match indices.iter().find(|&&i| i >= len) {
            Some(&index) => Err(Error::IndexOutOfBounds { what, index, len }),
            None => Ok(()),
        }
    }
}

/// Transductive or inductive learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningType {
    /// One graph; splits are node subsets of it.
    Transductive,
    /// A training graph and a separate evaluation graph.
    Inductive,
}

/// The graph(s) and split of one run.
///
/// In inductive mode node `k` of the training graph stands for
/// `split.train[k]`: labels are indexed in the evaluation graph's space,
/// and `split.val` / `split.test` index the evaluation graph.
#[derive(Debug, Clone)]
pub enum GraphStore {
    Transductive {
        graph: Arc<Graph>,
        split: Split,
    },
    Inductive {
        train: Arc<Graph>,
        eval: Arc<Graph>,
        split: Split,
    },
}

impl GraphStore {
    /// Single shared graph; every split index must be a node of it.
    pub fn transductive(graph: Graph, split: Split) -> Result<Self> {
        let n = graph.num_nodes();
        Split::check(&split.train, "train", n)?;
        Split::check(&split.val, "val", n)?;
        Split::check(&split.test, "test", n)?;
        Ok(GraphStore::Transductive {
            graph: Arc::new(graph),
            split,
        })
    }

    /// Separate training and evaluation graphs.
    pub fn inductive(train: Graph, eval: Graph, split: Split) -> Result<Self> {
        if train.num_nodes() != split.train.len() {
            return Err(Error::ShapeMismatch {
                what: "training graph nodes vs train split",
                expected: split.train.len(),
                got: train.num_nodes(),
            });
        }
        if train.num_features() != eval.num_features() {
            return Err(Error::ShapeMismatch {
                what: "feature dimension",
                expected: eval.num_features(),
                got: train.num_features(),
            });
        }
        let n = eval.num_nodes();
        Split::check(&split.train, "train", n)?;
        Split::check(&split.val, "val", n)?;
        Split::check(&split.test, "test", n)?;
        Ok(GraphStore::Inductive {
            train: Arc::new(train),
            eval: Arc::new(eval),
            split,
        })
    }

    pub fn learning_type(&self) -> LearningType {
        match self {
            GraphStore::Transductive { .. } => LearningType::Transductive,
            GraphStore::Inductive { .. } => LearningType::Inductive,
        }
    }

    /// Graph the training views are sampled from.
    pub fn train_graph(&self) -> &Arc<Graph> {
        match self {
            GraphStore::Transductive { graph, .. } => graph,
            GraphStore::Inductive { train, .. } => train,
        }
    }

    /// Graph backing validation and test views.
    pub fn eval_graph(&self) -> &Arc<Graph> {
        match self {
            GraphStore::Transductive { graph, .. } => graph,
            GraphStore::Inductive { eval, .. } => eval,
        }
    }

    pub fn split(&self) -> &Split {
        match self {
            GraphStore::Transductive { split, .. } | GraphStore::Inductive { split, .. } => split,
        }
    }

    /// Labels indexed by the split.
    pub fn labels(&self) -> &[usize] {
        self.eval_graph().labels()
    }

    pub fn num_features(&self) -> usize {
        self.eval_graph().num_features()
    }

    /// Classes across both graphs.
    pub fn num_classes(&self) -> usize {
        self.train_graph()
            .num_classes()
            .max(self.eval_graph().num_classes())
    }
}
