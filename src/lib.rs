//! keyann: approximate nearest-neighbour search with deduplicated top-k
//!
//! Every stored vector carries a grouping key. A query returns the `k`
//! closest vectors whose keys are pairwise distinct, so one key with many
//! stored vectors cannot crowd the others out of the result.
//!
//! ## Architecture
//! - Storage: dense-id vector arena plus key -> ids map (`index::store`)
//! - Graph: HNSW with a diversity-pruning neighbour heuristic (`index::hnsw`)
//! - Query: deduplicating top-k with adaptive ef widening (`query`)
//! - API: [`VectorIndex`], one read/write lock around store and graph
//!
//! ```
//! use keyann::{IndexConfig, QueryOptions, VectorIndex};
//!
//! let index: VectorIndex<u64> = VectorIndex::create(IndexConfig::new(3))?;
//! index.insert(&[0.0, 0.0, 1.0], 10)?;
//! index.insert(&[0.0, 0.1, 1.0], 10)?;
//! index.insert(&[1.0, 0.0, 0.0], 20)?;
//!
//! let outcome = index.query_with(&[0.0, 0.0, 1.0], &QueryOptions::new(2))?;
//! let keys: Vec<u64> = outcome.hits.iter().map(|h| h.key).collect();
//! assert_eq!(keys, vec![10, 20]);
//! # Ok::<(), keyann::IndexError>(())
//! ```

pub mod config;
pub mod distance;
pub mod index;
pub mod query;
pub mod types;

mod api;
mod error;

pub use api::{IndexStats, VectorIndex};
pub use config::{IndexConfig, QueryOptions};
pub use distance::{DistanceKind, DistanceMetric};
pub use error::{IndexError, Result};
pub use index::GraphStats;
pub use query::{DedupOutcome, Termination};
pub use types::{InternalId, Key, KeyedNeighbor, Neighbor, SearchHit};
