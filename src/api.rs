//! Public index API
//!
//! [`VectorIndex`] ties the vector store, the HNSW graph and the
//! deduplicating query engine together behind one read/write lock.

use crate::config::{IndexConfig, QueryOptions};
use crate::distance::DistanceMetric;
use crate::index::{GraphStats, HnswGraph, VectorStore};
use crate::query::{DedupOutcome, DedupSearcher};
use crate::types::{InternalId, Key, KeyedNeighbor, SearchHit};
use crate::{IndexError, Result};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Index-wide statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub len: usize,
    pub distinct_keys: usize,
    pub dimension: usize,
    pub capacity: Option<usize>,
    /// Approximate bytes held by stored vectors and keys
    pub memory_bytes: usize,
    pub graph: GraphStats,
}

/// Store and graph, always updated together under the write lock
struct IndexState<K: Key> {
    store: VectorStore<K>,
    graph: HnswGraph,
}

/// Approximate nearest-neighbour index whose results are deduplicated by key
///
/// # Quick start
///
/// ```
/// use keyann::{IndexConfig, VectorIndex};
///
/// let index: VectorIndex<u32> = VectorIndex::create(IndexConfig::new(2)).unwrap();
/// index.insert(&[0.0, 0.0], 1).unwrap();
/// index.insert(&[0.1, 0.0], 1).unwrap();
/// index.insert(&[1.0, 1.0], 2).unwrap();
///
/// let hits = index.query(&[0.0, 0.0], 2).unwrap();
/// assert_eq!(hits.len(), 2);
/// assert_eq!(hits[0].key, 1);
/// assert_eq!(hits[1].key, 2);
/// ```
///
/// # Operations
///
/// ## 1. Construction
/// - `create()`: index with the metric named in the config
/// - `with_metric()`: index with a caller-supplied metric
///
/// ## 2. Insertion
/// - `insert()` / `insert_batch()`
///
/// ## 3. Queries
/// - `query()`: top-k with distinct keys
/// - `query_with()`: same, with per-query ef bounds and termination details
/// - `query_batch()`: many queries in parallel
/// - `knn_search()`: raw neighbours, keys may repeat
///
/// ## 4. Inspection
/// - `get_vector()` / `get_key()` / `vectors_for_key()`
/// - `size()` / `distinct_keys()` / `capacity()` / `stats()`
///
/// Inserts serialize on a write lock; queries share a read lock, so they run
/// in parallel with each other and never see a half-linked node.
pub struct VectorIndex<K: Key> {
    config: IndexConfig,
    metric: Arc<dyn DistanceMetric>,
    inner: RwLock<IndexState<K>>,
}

impl<K: Key> VectorIndex<K> {
    // ============================================================================
    // 1. Construction
    // ============================================================================

    /// Create an empty index using `config.metric`
    pub fn create(config: IndexConfig) -> Result<Self> {
        let metric: Arc<dyn DistanceMetric> = Arc::new(config.metric);
        Self::with_metric(config, metric)
    }

    /// Create an empty index with a custom distance function
    ///
    /// `config.metric` is ignored.
    ///
    /// ```
    /// use keyann::{IndexConfig, VectorIndex};
    /// use std::sync::Arc;
    ///
    /// let manhattan = |a: &[f32], b: &[f32]| -> f32 {
    ///     a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    /// };
    /// let index: VectorIndex<String> =
    ///     VectorIndex::with_metric(IndexConfig::new(3), Arc::new(manhattan)).unwrap();
    /// assert!(index.is_empty());
    /// ```
    pub fn with_metric(config: IndexConfig, metric: Arc<dyn DistanceMetric>) -> Result<Self> {
        config.validate()?;

        debug!(
            dimension = config.dimension,
            m = config.m,
            ef_construction = config.ef_construction,
            metric = config.metric.name(),
            "creating vector index"
        );

        let state = IndexState {
            store: VectorStore::new(config.dimension, config.max_elements),
            graph: HnswGraph::from_config(&config),
        };
        Ok(Self {
            config,
            metric,
            inner: RwLock::new(state),
        })
    }

    // ============================================================================
    // 2. Insertion
    // ============================================================================

    /// Add one vector under `key` and return its internal id
    ///
    /// Either both the store and the graph take the vector or neither does.
    pub fn insert(&self, vector: &[f32], key: K) -> Result<InternalId> {
        let mut state = self.inner.write();
        self.insert_locked(&mut state, vector, key)
    }

    /// Insert many vectors under one write lock
    ///
    /// Stops at the first failure; entries before it stay inserted.
    pub fn insert_batch<I>(&self, items: I) -> Result<Vec<InternalId>>
    where
        I: IntoIterator<Item = (Vec<f32>, K)>,
    {
        let mut state = self.inner.write();
        let mut ids = Vec::new();
        for (vector, key) in items {
            ids.push(self.insert_locked(&mut state, &vector, key)?);
        }
        debug!(count = ids.len(), total = state.store.len(), "batch insert finished");
        Ok(ids)
    }

    fn insert_locked(&self, state: &mut IndexState<K>, vector: &[f32], key: K) -> Result<InternalId> {
        let IndexState { store, graph } = state;

        let id = store.insert(vector, key)?;
        if let Err(e) = graph.insert(id, &*store, self.metric.as_ref()) {
            warn!(id, error = %e, "graph insert failed, rolling back store");
            store.truncate(id as usize);
            return Err(e);
        }
        Ok(id)
    }

    // ============================================================================
    // 3. Queries
    // ============================================================================

    /// Up to `k` nearest hits with pairwise distinct keys, ascending by distance
    ///
    /// Fewer than `k` hits is not an error: it means the index holds fewer
    /// distinct keys or the search ceiling was reached first.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit<K>>> {
        Ok(self.query_with(vector, &QueryOptions::new(k))?.hits)
    }

    /// Deduplicated query with explicit ef bounds
    pub fn query_with(&self, vector: &[f32], options: &QueryOptions) -> Result<DedupOutcome<K>> {
        let state = self.inner.read();
        DedupSearcher::new(&state.store, &state.graph, self.metric.as_ref(), &self.config)
            .search(vector, options)
    }

    /// Run independent queries in parallel
    ///
    /// Results come back in input order.
    pub fn query_batch(&self, vectors: &[Vec<f32>], k: usize) -> Result<Vec<Vec<SearchHit<K>>>> {
        let options = QueryOptions::new(k);
        vectors
            .par_iter()
            .map(|vector| self.query_with(vector, &options).map(|outcome| outcome.hits))
            .collect()
    }

    /// Plain k-nearest-neighbour search without key deduplication
    ///
    /// `ef` defaults to `max(ef_search, k)`.
    pub fn knn_search(&self, vector: &[f32], k: usize, ef: Option<usize>) -> Result<Vec<KeyedNeighbor<K>>> {
        self.check_dimension(vector)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let state = self.inner.read();
        let ef = ef.unwrap_or(self.config.ef_search).max(k);
        let raw = state
            .graph
            .knn_search(&state.store, self.metric.as_ref(), vector, k, ef);

        raw.into_iter()
            .take(k)
            .map(|n| -> Result<KeyedNeighbor<K>> {
                Ok(KeyedNeighbor {
                    id: n.id,
                    key: state.store.get_key(n.id)?.clone(),
                    distance: n.distance,
                })
            })
            .collect()
    }

    // ============================================================================
    // 4. Inspection
    // ============================================================================

    /// Number of stored vectors
    pub fn size(&self) -> usize {
        self.inner.read().store.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Copy of the vector stored under `id`
    pub fn get_vector(&self, id: InternalId) -> Result<Vec<f32>> {
        Ok(self.inner.read().store.get_vector(id)?.to_vec())
    }

    /// Key stored under `id`
    pub fn get_key(&self, id: InternalId) -> Result<K> {
        Ok(self.inner.read().store.get_key(id)?.clone())
    }

    /// Ids of every vector inserted under `key`, oldest first
    pub fn vectors_for_key(&self, key: &K) -> Vec<InternalId> {
        self.inner.read().store.ids_for_key(key).to_vec()
    }

    pub fn distinct_keys(&self) -> usize {
        self.inner.read().store.distinct_keys()
    }

    /// Current element limit (`None` = unbounded)
    pub fn capacity(&self) -> Option<usize> {
        self.inner.read().store.capacity()
    }

    /// Raise, lower or remove the element limit
    ///
    /// A limit below the current size is rejected.
    pub fn set_capacity(&self, capacity: Option<usize>) -> Result<()> {
        let mut state = self.inner.write();
        state.store.set_capacity(capacity)?;
        debug!(?capacity, "index capacity changed");
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.inner.read();
        IndexStats {
            len: state.store.len(),
            distinct_keys: state.store.distinct_keys(),
            dimension: self.config.dimension,
            capacity: state.store.capacity(),
            memory_bytes: state.store.memory_usage(),
            graph: state.graph.stats(),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.config.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
