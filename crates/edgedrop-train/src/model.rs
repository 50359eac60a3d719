//! The contract between the epoch loop and a trainable model.
//!
//! The network itself (layers, optimizer, learning-rate schedule) lives
//! outside this crate. A model sees a feature matrix and a normalized
//! propagation operator and answers with per-node class log-probabilities.

use crate::error::Result;
use crate::metrics::Targets;
use edgedrop_core::SparseAdj;
use ndarray::Array2;

/// A node classifier trained by [`Trainer`](crate::Trainer).
pub trait Model {
    /// Snapshot of the trainable state; what early stopping persists.
    type Params;

    /// One optimization step on `targets`.
    ///
    /// Returns the log-probabilities computed in the forward pass, before
    /// the update, so the caller can score the step.
    fn train_step(
        &mut self,
        features: &Array2<f32>,
        operator: &SparseAdj,
        targets: &Targets,
    ) -> Result<Array2<f32>>;

    /// Inference-mode forward pass (no dropout, no update).
    fn predict(&self, features: &Array2<f32>, operator: &SparseAdj) -> Result<Array2<f32>>;

    fn params(&self) -> Self::Params;

    fn load_params(&mut self, params: Self::Params);

    /// Per-layer `(weight_norms, grad_norms)` after the latest step.
    ///
    /// Recorded each epoch when provided; models that do not track them
    /// keep the default.
    fn layer_norms(&self) -> Option<(Vec<f32>, Vec<f32>)> {
        None
    }
}
