//! Memoized normalization of the fixed (unsampled) views.
//!
//! Validation, test and unsampled training adjacencies never change during
//! a run, so their normalized operators are computed once and shared. The
//! key space is `schemes × view kinds`, a small constant, so entries are
//! never evicted.

use crate::{Normalization, Normalizer, SparseAdj};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which view of the dataset an operator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Train,
    Validation,
    Test,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewKind::Train => "train",
            ViewKind::Validation => "val",
            ViewKind::Test => "test",
        };
        f.write_str(name)
    }
}

/// Cache key: one normalized operator per (scheme, view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub scheme: Normalization,
    pub view: ViewKind,
}

impl CacheKey {
    pub fn new(scheme: Normalization, view: ViewKind) -> Self {
        Self { scheme, view }
    }
}

/// Process-lifetime cache of normalized operators.
///
/// The caller guarantees that one key always names the same logical
/// adjacency; the cache cannot detect a violation and will return the
/// operator computed on first use.
#[derive(Debug, Default)]
pub struct NormalizationCache {
    entries: HashMap<CacheKey, Arc<SparseAdj>>,
    hits: usize,
    misses: usize,
}

impl NormalizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the operator for `key`, normalizing `adj` on first request.
    pub fn get_or_compute<N: Normalizer + ?Sized>(
        &mut self,
        key: CacheKey,
        adj: &SparseAdj,
        normalizer: &N,
    ) -> Arc<SparseAdj> {
        if let Some(op) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(op);
        }
        self.misses += 1;
        tracing::debug!(scheme = %key.scheme, view = %key.view, "normalizing adjacency");
        let op = Arc::new(normalizer.normalize(adj, key.scheme));
        self.entries.insert(key, Arc::clone(&op));
        op
    }

    /// Cached operator, without computing.
    pub fn get(&self, key: &CacheKey) -> Option<&Arc<SparseAdj>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requests served from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Requests that had to normalize.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardNormalizer;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl Normalizer for Counting {
        fn normalize(&self, adj: &SparseAdj, scheme: Normalization) -> SparseAdj {
            self.calls.set(self.calls.get() + 1);
            scheme.apply(adj)
        }
    }

    fn triangle() -> SparseAdj {
        SparseAdj::from_edges(3, &[(0, 1), (1, 2), (2, 0)])
            .unwrap()
            .symmetrize()
    }

    #[test]
    fn test_second_request_is_a_hit() {
        let counting = Counting::default();
        let mut cache = NormalizationCache::new();
        let key = CacheKey::new(Normalization::AugNormAdj, ViewKind::Validation);

        let first = cache.get_or_compute(key, &triangle(), &counting);
        // A distinct but equal adjacency object.
        let second = cache.get_or_compute(key, &triangle(), &counting);

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counting.calls.get(), 1);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_keys_are_independent() {
        let counting = Counting::default();
        let mut cache = NormalizationCache::new();
        let adj = triangle();

        cache.get_or_compute(CacheKey::new(Normalization::AugNormAdj, ViewKind::Validation), &adj, &counting);
        cache.get_or_compute(CacheKey::new(Normalization::AugNormAdj, ViewKind::Test), &adj, &counting);
        cache.get_or_compute(CacheKey::new(Normalization::NormAdj, ViewKind::Test), &adj, &counting);

        assert_eq!(counting.calls.get(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_first_computation_wins() {
        let mut cache = NormalizationCache::new();
        let key = CacheKey::new(Normalization::NoNorm, ViewKind::Train);
        let first = cache.get_or_compute(key, &triangle(), &StandardNormalizer);
        let other = cache.get_or_compute(key, &SparseAdj::zeros(3), &StandardNormalizer);
        assert_eq!(first, other);
        assert_eq!(*other, triangle());
    }

    #[test]
    fn test_get_without_compute() {
        let mut cache = NormalizationCache::new();
        let key = CacheKey::new(Normalization::RWalk, ViewKind::Test);
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
        cache.get_or_compute(key, &triangle(), &StandardNormalizer);
        assert!(cache.contains(&key));
    }
}
