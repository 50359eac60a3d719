//! Per-epoch adjacency views.
//!
//! [`Sampler`] is what a training loop talks to. Each epoch it asks for a
//! freshly sampled training view and for the fixed validation view; once at
//! the end it asks for the test view. Each view pairs a normalized operator
//! with the feature matrix of the graph it was built from:
//!
//! | View | Graph (transductive) | Graph (inductive) | Cached |
//! |------|----------------------|-------------------|--------|
//! | training | shared graph | training graph | never |
//! | validation | shared graph | evaluation graph | `(scheme, Validation)` |
//! | test | shared graph | evaluation graph | `(scheme, Test)` |
//!
//! The sampler owns the run's only random generator. It is seeded once at
//! construction and never re-seeded.

use crate::algo::sampling::sample_edges;
use crate::{
    CacheKey, GraphStore, LearningType, Normalization, NormalizationCache, Normalizer, Result,
    SparseAdj, StandardNormalizer, ViewKind,
};
use ndarray::Array2;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::sync::Arc;

/// A propagation operator and the features it propagates.
#[derive(Debug, Clone)]
pub struct View {
    pub operator: Arc<SparseAdj>,
    pub features: Arc<Array2<f32>>,
}

impl View {
    pub fn num_nodes(&self) -> usize {
        self.operator.num_nodes()
    }
}

/// Labels and split indices, fixed for the whole run.
#[derive(Debug, Clone, Copy)]
pub struct SplitView<'a> {
    pub labels: &'a [usize],
    pub train: &'a [usize],
    pub val: &'a [usize],
    pub test: &'a [usize],
}

/// Builds training, validation and test views over a [`GraphStore`].
///
/// # Example
///
/// ```rust
/// use edgedrop_core::{Graph, GraphStore, Normalization, Sampler, Split, SparseAdj};
/// use ndarray::Array2;
///
/// let adj = SparseAdj::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap().symmetrize();
/// let graph = Graph::new(adj, Array2::ones((4, 2)), vec![0, 1, 0, 1]).unwrap();
/// let store = GraphStore::transductive(graph, Split::new(vec![0, 1], vec![2], vec![3])).unwrap();
///
/// let mut sampler = Sampler::new(store, 42);
/// let train = sampler.training_view(0.8, Normalization::AugNormAdj).unwrap();
/// let val = sampler.validation_view(Normalization::AugNormAdj);
/// assert_eq!(train.num_nodes(), val.num_nodes());
/// ```
#[derive(Debug)]
pub struct Sampler<N = StandardNormalizer> {
    store: GraphStore,
    cache: NormalizationCache,
    normalizer: N,
    rng: XorShiftRng,
}

impl Sampler<StandardNormalizer> {
    /// Sampler with the standard normalizer.
    pub fn new(store: GraphStore, seed: u64) -> Self {
        Self::with_normalizer(store, StandardNormalizer, seed)
    }
}

impl<N: Normalizer> Sampler<N> {
    /// Sampler with a custom normalizer.
    pub fn with_normalizer(store: GraphStore, normalizer: N, seed: u64) -> Self {
        tracing::debug!(
            learning_type = ?store.learning_type(),
            train_nodes = store.train_graph().num_nodes(),
            eval_nodes = store.eval_graph().num_nodes(),
            seed,
            "sampler ready"
        );
        Self {
            store,
            cache: NormalizationCache::new(),
            normalizer,
            rng: XorShiftRng::seed_from_u64(seed),
        }
    }

    pub fn learning_type(&self) -> LearningType {
        self.store.learning_type()
    }

    /// Feature dimension.
    pub fn nfeat(&self) -> usize {
        self.store.num_features()
    }

    /// Number of classes.
    pub fn nclass(&self) -> usize {
        self.store.num_classes()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn cache(&self) -> &NormalizationCache {
        &self.cache
    }

    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    /// A fresh randomly sampled training view.
    ///
    /// Always samples and normalizes anew; nothing here is cached.
    pub fn training_view(&mut self, retain_probability: f64, scheme: Normalization) -> Result<View> {
        let graph = Arc::clone(self.store.train_graph());
        let sampled = sample_edges(graph.adjacency(), retain_probability, &mut self.rng)?;
        tracing::debug!(
            retain_probability,
            kept = sampled.num_undirected_edges(),
            total = graph.adjacency().num_undirected_edges(),
            "sampled training view"
        );
        let operator = self.normalizer.normalize(&sampled, scheme);
        Ok(View {
            operator: Arc::new(operator),
            features: Arc::clone(graph.features()),
        })
    }

    /// The unsampled training graph, normalized and cached under
    /// `(scheme, Train)`.
    pub fn unsampled_training_view(&mut self, scheme: Normalization) -> View {
        let graph = Arc::clone(self.store.train_graph());
        self.cached_view(graph, scheme, ViewKind::Train)
    }

    /// Full validation adjacency, cached under `(scheme, Validation)`.
    pub fn validation_view(&mut self, scheme: Normalization) -> View {
        let graph = Arc::clone(self.store.eval_graph());
        self.cached_view(graph, scheme, ViewKind::Validation)
    }

    /// Full test adjacency, cached under `(scheme, Test)`.
    pub fn test_view(&mut self, scheme: Normalization) -> View {
        let graph = Arc::clone(self.store.eval_graph());
        self.cached_view(graph, scheme, ViewKind::Test)
    }

    /// Labels and split, as fixed when the store was built.
    pub fn label_and_split_view(&self) -> SplitView<'_> {
        let split = self.store.split();
        SplitView {
            labels: self.store.labels(),
            train: &split.train,
            val: &split.val,
            test: &split.test,
        }
    }

    fn cached_view(
        &mut self,
        graph: Arc<crate::Graph>,
        scheme: Normalization,
        view: ViewKind,
    ) -> View {
        let operator = self.cache.get_or_compute(
            CacheKey::new(scheme, view),
            graph.adjacency(),
            &self.normalizer,
        );
        View {
            operator,
            features: Arc::clone(graph.features()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Graph, Split};
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

    fn chain(n: usize, nfeat: usize) -> Graph {
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        let adj = SparseAdj::from_edges(n, &edges).unwrap().symmetrize();
        Graph::new(adj, Array2::ones((n, nfeat)), (0..n).map(|i| i % 3).collect()).unwrap()
    }

    fn transductive() -> GraphStore {
        GraphStore::transductive(chain(10, 4), Split::new(vec![0, 1, 2], vec![3, 4], vec![5, 6]))
            .unwrap()
    }

    fn inductive() -> GraphStore {
        GraphStore::inductive(
            chain(3, 4),
            chain(10, 4),
            Split::new(vec![0, 1, 2], vec![3, 4], vec![5, 6]),
        )
        .unwrap()
    }

    #[test]
    fn test_training_view_never_cached() {
        let mut sampler = Sampler::with_normalizer(transductive(), Counting::default(), 1);
        sampler.training_view(0.5, Normalization::AugNormAdj).unwrap();
        sampler.training_view(0.5, Normalization::AugNormAdj).unwrap();
        assert_eq!(sampler.normalizer().calls.get(), 2);
        assert!(sampler.cache().is_empty());
    }

    #[test]
    fn test_validation_view_cached() {
        let mut sampler = Sampler::with_normalizer(transductive(), Counting::default(), 1);
        let a = sampler.validation_view(Normalization::AugNormAdj);
        let b = sampler.validation_view(Normalization::AugNormAdj);
        assert!(Arc::ptr_eq(&a.operator, &b.operator));
        assert_eq!(sampler.normalizer().calls.get(), 1);

        sampler.test_view(Normalization::AugNormAdj);
        sampler.test_view(Normalization::AugNormAdj);
        assert_eq!(sampler.normalizer().calls.get(), 2);
        assert_eq!(sampler.cache().hits(), 2);
    }

    #[test]
    fn test_transductive_views_share_graph() {
        let mut sampler = Sampler::new(transductive(), 3);
        let train = sampler.training_view(0.7, Normalization::NormAdj).unwrap();
        let val = sampler.validation_view(Normalization::NormAdj);
        let test = sampler.test_view(Normalization::NormAdj);
        assert_eq!(train.num_nodes(), val.num_nodes());
        assert!(Arc::ptr_eq(&train.features, &val.features));
        assert!(Arc::ptr_eq(&val.features, &test.features));
        assert_eq!(sampler.learning_type(), LearningType::Transductive);
    }

    #[test]
    fn test_inductive_views_use_separate_graphs() {
        let mut sampler = Sampler::new(inductive(), 3);
        let train = sampler.training_view(0.7, Normalization::AugNormAdj).unwrap();
        let val = sampler.validation_view(Normalization::AugNormAdj);
        assert_eq!(train.num_nodes(), 3);
        assert_eq!(val.num_nodes(), 10);
        assert_eq!(train.features.nrows(), 3);
        assert_eq!(val.features.nrows(), 10);
        assert_eq!(sampler.learning_type(), LearningType::Inductive);
    }

    #[test]
    fn test_full_retention_matches_unsampled_view() {
        let mut sampler = Sampler::new(transductive(), 3);
        let sampled = sampler.training_view(1.0, Normalization::AugNormAdj).unwrap();
        let unsampled = sampler.unsampled_training_view(Normalization::AugNormAdj);
        assert_eq!(*sampled.operator, *unsampled.operator);
    }

    #[test]
    fn test_label_and_split_view() {
        let sampler = Sampler::new(transductive(), 0);
        let split = sampler.label_and_split_view();
        assert_eq!(split.labels.len(), 10);
        assert_eq!(split.train, &[0, 1, 2]);
        assert_eq!(split.val, &[3, 4]);
        assert_eq!(split.test, &[5, 6]);
        assert_eq!(sampler.nfeat(), 4);
        assert_eq!(sampler.nclass(), 3);
    }

    #[test]
    fn test_invalid_probability_propagates() {
        let mut sampler = Sampler::new(transductive(), 0);
        assert!(sampler
            .training_view(f64::NAN, Normalization::AugNormAdj)
            .is_err());
    }
}
