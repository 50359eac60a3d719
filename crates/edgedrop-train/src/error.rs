use thiserror::Error;

/// Errors that can occur in edgedrop-train.
#[derive(Error, Debug)]
pub enum Error {
    /// Sampling, normalization or graph construction failed.
    #[error(transparent)]
    Core(#[from] edgedrop_core::Error),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// No snapshot has been persisted, or the checkpoint path does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Configuration value out of range or inconsistent.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// The model reported a failure.
    #[error("Model error: {0}")]
    Model(String),
}

/// Result type alias for edgedrop-train.
pub type Result<T> = std::result::Result<T, Error>;
