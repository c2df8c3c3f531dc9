//! Hierarchical Navigable Small World graph
//!
//! The graph stores only ids and adjacency; vectors are read through
//! [`VectorSource`] and distances through [`crate::distance::DistanceMetric`].

pub mod graph;
pub mod insert;
pub mod pruner;
pub mod search;
pub mod visited;

pub use graph::{GraphParams, GraphStats, HnswGraph, VectorSource};
pub use pruner::select_neighbors;
pub use visited::VisitedSet;
