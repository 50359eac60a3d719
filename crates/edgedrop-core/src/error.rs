//! Error types for edgedrop-core.

use thiserror::Error;

/// Errors raised while building graphs, parsing schemes or sampling views.
#[derive(Debug, Error)]
pub enum Error {
    /// Adjacency, features and labels disagree on the number of nodes.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// A split (or edge) refers to a node outside the graph.
    #[error("{what} index {index} out of bounds for {len} nodes")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A feature row has no defined value at all.
    #[error("feature row {row} is entirely undefined")]
    UndefinedFeatures { row: usize },

    /// Normalization scheme name not recognized.
    #[error("unknown normalization scheme: {0}")]
    UnknownScheme(String),

    /// Edge retain probability is NaN or negative.
    #[error("invalid retain probability: {0}")]
    InvalidProbability(f64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for edgedrop-core.
pub type Result<T> = std::result::Result<T, Error>;
