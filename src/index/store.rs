//! In-memory vector storage keyed by dense internal ids
//!
//! Layout:
//! - `data`: every vector back to back, `id * dimension` offsets
//! - `keys`: grouping key per id
//! - `key_refs`: key -> ids carrying it, in insertion order
//!
//! Ids are handed out in insertion order and never reused, so the arena only
//! ever grows (apart from [`VectorStore::truncate`] rolling back a failed insert).

use super::hnsw::VectorSource;
use crate::types::{InternalId, Key};
use crate::{IndexError, Result};
use ahash::AHashMap;

/// Owns vector payloads and their grouping keys
#[derive(Debug, Clone)]
pub struct VectorStore<K: Key> {
    dimension: usize,
    capacity: Option<usize>,
    data: Vec<f32>,
    keys: Vec<K>,
    key_refs: AHashMap<K, Vec<InternalId>>,
}

impl<K: Key> VectorStore<K> {
    /// Create an empty store; `capacity` of `None` means unbounded
    pub fn new(dimension: usize, capacity: Option<usize>) -> Self {
        let reserve = capacity.unwrap_or(0).min(1 << 16);
        Self {
            dimension,
            capacity,
            data: Vec::with_capacity(reserve * dimension),
            keys: Vec::with_capacity(reserve),
            key_refs: AHashMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of distinct keys currently referenced
    pub fn distinct_keys(&self) -> usize {
        self.key_refs.len()
    }

    /// Check that `vector` could be inserted right now, without storing it
    pub fn check_insert(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if let Some(capacity) = self.capacity {
            if self.len() >= capacity {
                return Err(IndexError::CapacityExceeded { capacity });
            }
        }
        if self.len() > InternalId::MAX as usize {
            return Err(IndexError::CapacityExceeded {
                capacity: InternalId::MAX as usize + 1,
            });
        }
        Ok(())
    }

    /// Store a vector and its key, returning the newly allocated id
    pub fn insert(&mut self, vector: &[f32], key: K) -> Result<InternalId> {
        self.check_insert(vector)?;

        let id = self.keys.len() as InternalId;
        self.data.extend_from_slice(vector);
        self.key_refs.entry(key.clone()).or_default().push(id);
        self.keys.push(key);
        Ok(id)
    }

    /// Vector stored under `id`
    pub fn get_vector(&self, id: InternalId) -> Result<&[f32]> {
        let idx = id as usize;
        if idx >= self.len() {
            return Err(IndexError::UnknownId(id));
        }
        let start = idx * self.dimension;
        Ok(&self.data[start..start + self.dimension])
    }

    /// Key stored under `id`
    pub fn get_key(&self, id: InternalId) -> Result<&K> {
        self.keys.get(id as usize).ok_or(IndexError::UnknownId(id))
    }

    /// All ids carrying `key`, oldest first
    pub fn ids_for_key(&self, key: &K) -> &[InternalId] {
        self.key_refs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.key_refs.contains_key(key)
    }

    /// Change the element limit. Shrinking below the current size is refused.
    pub fn set_capacity(&mut self, capacity: Option<usize>) -> Result<()> {
        if let Some(new_cap) = capacity {
            if new_cap == 0 {
                return Err(IndexError::InvalidConfiguration(
                    "capacity must be at least 1 when set".to_string(),
                ));
            }
            if new_cap < self.len() {
                return Err(IndexError::InvalidConfiguration(format!(
                    "capacity {} is below the current size {}",
                    new_cap,
                    self.len()
                )));
            }
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Drop every entry with id >= `len`.
    ///
    /// Only used to undo an insert whose graph half failed.
    pub(crate) fn truncate(&mut self, len: usize) {
        while self.keys.len() > len {
            let Some(key) = self.keys.pop() else { break };
            let id = self.keys.len() as InternalId;
            if let Some(ids) = self.key_refs.get_mut(&key) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.key_refs.remove(&key);
                }
            }
        }
        self.data.truncate(len * self.dimension);
    }

    /// Approximate heap usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.data.capacity() * std::mem::size_of::<f32>()
            + self.keys.capacity() * std::mem::size_of::<K>()
            + self.key_refs.len()
                * (std::mem::size_of::<K>() + std::mem::size_of::<Vec<InternalId>>())
            + self.len() * std::mem::size_of::<InternalId>()
    }
}

impl<K: Key> VectorSource for VectorStore<K> {
    #[inline]
    fn vector(&self, id: InternalId) -> &[f32] {
        let start = id as usize * self.dimension;
        &self.data[start..start + self.dimension]
    }
}
