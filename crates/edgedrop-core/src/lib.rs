// Allow minor clippy style warnings at crate level
// These are mostly style preferences, not bugs
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

//! Adjacency sampling and normalization for GCN training.
//!
//! This crate is the data side of training deep graph convolutional
//! networks with random edge dropping (DropEdge) on citation graphs:
//!
//! - [`SparseAdj`] - Square CSR adjacency / propagation operator
//! - [`Graph`] - Adjacency, node features and labels
//! - [`GraphStore`] - One shared graph (transductive) or train + eval graphs (inductive)
//! - [`Normalization`] - Closed set of normalization schemes
//! - [`NormalizationCache`] - Memoized operators for the fixed views
//! - [`Sampler`] - Per-epoch training / validation / test views
//!
//! # Why drop edges?
//!
//! Deep GCNs over-smooth: repeated multiplication by a normalized adjacency
//! drives node representations towards a common vector. Randomly removing a
//! fraction of edges every epoch slows that convergence and acts as data
//! augmentation, since each epoch propagates over a different graph.
//!
//! ```text
//! epoch k:  A ──drop edges (p)──▶ A_k + I ──normalize──▶ Â_k ──▶ model(X, Â_k)
//! eval:     A ─────────────────────────────normalize──▶ Â   (cached)
//! ```
//!
//! # Algorithms
//!
//! - [`algo::sampling`] - Random edge sampling
//!
//! # Example
//!
//! ```rust
//! use edgedrop_core::{Graph, GraphStore, Normalization, Sampler, Split, SparseAdj};
//! use ndarray::Array2;
//!
//! let adj = SparseAdj::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
//!     .unwrap()
//!     .symmetrize();
//! let graph = Graph::new(adj, Array2::ones((4, 3)), vec![0, 1, 0, 1]).unwrap();
//! let store = GraphStore::transductive(graph, Split::new(vec![0, 1], vec![2], vec![3])).unwrap();
//!
//! let mut sampler = Sampler::new(store, 42);
//! for _epoch in 0..3 {
//!     let view = sampler.training_view(0.5, Normalization::AugNormAdj).unwrap();
//!     assert!(view.operator.is_symmetric());
//! }
//! let test = sampler.test_view(Normalization::AugNormAdj);
//! assert_eq!(test.num_nodes(), 4);
//! ```

pub mod algo;
mod cache;
mod error;
pub mod formats;
mod graph;
pub mod normalize;
pub mod sampler;
mod sparse;

pub use cache::{CacheKey, NormalizationCache, ViewKind};
pub use error::{Error, Result};
pub use graph::{Graph, GraphStore, LearningType, Split, SplitSizes, TaskType};
pub use normalize::{normalize, Normalization, Normalizer, Propagation, Recipe, Shift, StandardNormalizer};
pub use sampler::{Sampler, SplitView, View};
pub use sparse::SparseAdj;
