//! Random edge sampling (DropEdge) for GCN training.
//!
//! Every training epoch sees a different sparsified view of the graph: each
//! undirected edge survives independently with probability `p`, surviving
//! edges are mirrored, and every node keeps a unit self-loop.
//!
//! # Key Types
//!
//! - [`sample_edges`] - Draw one sampled adjacency from a caller-owned generator
//! - [`EdgeSampler`] - Retain probability plus a seeded generator, for repeated draws
//!
//! The generator is always passed in (or owned by the sampler) rather than
//! taken from thread-local state, so a run is reproducible from its seed.
//! Seed once per run: draws from the same stream are independent, draws
//! from re-seeded streams are not.

use crate::{Error, Result, SparseAdj};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// Draw a sampled view of `adj`.
///
/// # Arguments
/// * `adj` - Source adjacency (undirected; only the strict upper triangle is read)
/// * `retain_probability` - Probability of keeping each edge
/// * `rng` - Random source
///
/// # Returns
/// A new symmetric matrix whose off-diagonal entries are a subset of `adj`'s
/// and whose diagonal is all ones. With `retain_probability >= 1.0` no random
/// numbers are drawn and the result is `adj` with a unit diagonal.
///
/// # Errors
/// [`Error::InvalidProbability`] for NaN or negative probabilities.
///
/// # Complexity
/// O(nnz log nnz)
pub fn sample_edges<R: Rng + ?Sized>(
    adj: &SparseAdj,
    retain_probability: f64,
    rng: &mut R,
) -> Result<SparseAdj> {
    if retain_probability.is_nan() || retain_probability < 0.0 {
        return Err(Error::InvalidProbability(retain_probability));
    }
    if retain_probability >= 1.0 {
        return Ok(adj.with_unit_diagonal());
    }

    let n = adj.num_nodes();
    let mut kept: Vec<(usize, usize, f32)> = Vec::new();
    for (i, j, w) in adj.upper_edges() {
        if rng.gen_bool(retain_probability) {
            kept.push((i, j, w));
            kept.push((j, i, w));
        }
    }
    kept.extend((0..n).map(|i| (i, i, 1.0)));
    kept.sort_unstable_by_key(|&(u, v, _)| (u, v));

    tracing::trace!(
        retained = (kept.len() - n) / 2,
        total = adj.num_undirected_edges(),
        "sampled edges"
    );
    Ok(SparseAdj::from_sorted(n, kept))
}

/// Repeated edge sampling from a single seeded stream.
///
/// # Example
///
/// ```rust
/// use edgedrop_core::SparseAdj;
/// use edgedrop_core::algo::sampling::EdgeSampler;
///
/// let adj = SparseAdj::from_edges(3, &[(0, 1), (1, 2)]).unwrap().symmetrize();
/// let mut sampler = EdgeSampler::new(0.5, 42);
///
/// let view = sampler.sample(&adj).unwrap();
/// assert!(view.is_symmetric());
/// assert_eq!(view.diagonal(), vec![1.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct EdgeSampler {
    retain_probability: f64,
    rng: XorShiftRng,
}

impl EdgeSampler {
    /// Create a sampler.
    ///
    /// # Arguments
    /// * `retain_probability` - Probability of keeping each edge
    /// * `seed` - Random seed for reproducibility
    pub fn new(retain_probability: f64, seed: u64) -> Self {
        Self {
            retain_probability,
            rng: XorShiftRng::seed_from_u64(seed),
        }
    }

    /// Probability of keeping each edge.
    pub fn retain_probability(&self) -> f64 {
        self.retain_probability
    }

    /// Draw the next sampled view.
    pub fn sample(&mut self, adj: &SparseAdj) -> Result<SparseAdj> {
        sample_edges(adj, self.retain_probability, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> SparseAdj {
        let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        SparseAdj::from_edges(n, &edges).unwrap().symmetrize()
    }

    #[test]
    fn test_full_retention_is_deterministic() {
        let adj = ring(6);
        let mut rng = XorShiftRng::seed_from_u64(1);
        let a = sample_edges(&adj, 1.0, &mut rng).unwrap();
        let b = sample_edges(&adj, 1.5, &mut rng).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, adj.with_unit_diagonal());
    }

    #[test]
    fn test_full_retention_draws_nothing() {
        let adj = ring(6);
        let mut used = XorShiftRng::seed_from_u64(7);
        let mut fresh = XorShiftRng::seed_from_u64(7);
        sample_edges(&adj, 1.0, &mut used).unwrap();
        assert_eq!(used.next_u64(), fresh.next_u64());
    }

    #[test]
    fn test_zero_retention_keeps_only_loops() {
        let adj = ring(5);
        let mut rng = XorShiftRng::seed_from_u64(3);
        let view = sample_edges(&adj, 0.0, &mut rng).unwrap();
        assert_eq!(view, SparseAdj::identity(5));
    }

    #[test]
    fn test_invalid_probability() {
        let adj = ring(3);
        let mut rng = XorShiftRng::seed_from_u64(0);
        assert!(matches!(
            sample_edges(&adj, -0.1, &mut rng),
            Err(Error::InvalidProbability(_))
        ));
        assert!(matches!(
            sample_edges(&adj, f64::NAN, &mut rng),
            Err(Error::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_partial_retention_subset_and_symmetric() {
        let adj = ring(50);
        let mut sampler = EdgeSampler::new(0.5, 42);
        for _ in 0..10 {
            let view = sampler.sample(&adj).unwrap();
            assert!(view.is_symmetric());
            for (i, j, _) in view.iter().filter(|&(i, j, _)| i != j) {
                assert!(adj.get(i, j).is_some(), "invented edge ({i}, {j})");
            }
            assert_eq!(view.diagonal(), vec![1.0; 50]);
        }
    }

    #[test]
    fn test_successive_draws_differ() {
        let adj = ring(100);
        let mut sampler = EdgeSampler::new(0.5, 42);
        let a = sampler.sample(&adj).unwrap();
        let b = sampler.sample(&adj).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_seed_reproduces() {
        let adj = ring(40);
        let a = EdgeSampler::new(0.3, 9).sample(&adj).unwrap();
        let b = EdgeSampler::new(0.3, 9).sample(&adj).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_does_not_mutate_source() {
        let adj = ring(10);
        let before = adj.clone();
        let _ = EdgeSampler::new(0.2, 5).sample(&adj).unwrap();
        assert_eq!(adj, before);
    }
}
