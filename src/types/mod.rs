//! Core value types shared by the store, the graph and the query layer

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Dense per-insertion identifier. Assigned 0, 1, 2, ... and never reused.
pub type InternalId = u32;

/// External grouping key attached to every inserted vector.
///
/// Several vectors may share one key (e.g. chunks of the same document).
/// Any hashable, cloneable, thread-safe type qualifies.
pub trait Key: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> Key for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Graph-level search candidate: an internal id and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: InternalId,
    pub distance: f32,
}

impl Neighbor {
    pub fn new(id: InternalId, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// One row of a deduplicated query answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit<K> {
    pub key: K,
    pub distance: f32,
    /// The vector that represented `key` (its closest one found).
    pub id: InternalId,
}

impl<K> SearchHit<K> {
    /// Split into the `(key, distance)` pair.
    pub fn into_pair(self) -> (K, f32) {
        (self.key, self.distance)
    }
}

/// Raw (non-deduplicated) neighbour with its key resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedNeighbor<K> {
    pub id: InternalId,
    pub key: K,
    pub distance: f32,
}
