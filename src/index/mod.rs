//! Storage and graph layers
//!
//! - `store`: vectors and their grouping keys, addressed by dense ids
//! - `hnsw`: the navigable proximity graph over those ids

pub mod hnsw;
pub mod store;

pub use hnsw::{GraphParams, GraphStats, HnswGraph, VectorSource};
pub use store::VectorStore;
