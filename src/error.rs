//! Error types for the keyann index

use crate::types::InternalId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Construction parameters rejected by `IndexConfig::validate`.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The index already holds `capacity` elements.
    #[error("Capacity exceeded: index is limited to {capacity} elements")]
    CapacityExceeded { capacity: usize },

    /// An id that the store and graph should agree on is missing.
    /// Reaching this means the index invariants were broken.
    #[error("Unknown internal id: {0}")]
    UnknownId(InternalId),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}
