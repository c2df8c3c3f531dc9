//! HNSW graph structure
//!
//! Adjacency is stored per node as one neighbour list per layer it belongs
//! to. Vectors live outside the graph and are reached through
//! [`VectorSource`], so the graph only ever holds ids.

use crate::config::IndexConfig;
use crate::types::InternalId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Read access to stored vectors by internal id
///
/// Callers guarantee every id handed to the graph is present; the graph does
/// not re-check on its hot path.
pub trait VectorSource {
    fn vector(&self, id: InternalId) -> &[f32];
}

/// Graph tuning parameters, derived from [`IndexConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct GraphParams {
    pub m: usize,
    pub m_max0: usize,
    pub ef_construction: usize,
    pub max_level: usize,
    /// Level normalization `1 / ln(m)`
    pub level_mult: f64,
}

impl GraphParams {
    pub fn from_config(config: &IndexConfig) -> Self {
        // m = 1 would make ln(m) zero
        let level_mult = 1.0 / (config.m.max(2) as f64).ln();
        Self {
            m: config.m,
            m_max0: config.m_max0,
            ef_construction: config.ef_construction,
            max_level: config.max_level,
            level_mult,
        }
    }

    /// Neighbour list cap for `layer`
    #[inline]
    pub fn max_links(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m_max0
        } else {
            self.m
        }
    }
}

/// Graph shape summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub max_layer: usize,
    pub entry_point: Option<InternalId>,
    /// Directed edges across all layers
    pub total_edges: usize,
    /// Mean out-degree on layer 0
    pub avg_degree: f32,
    /// `layer_sizes[l]` = number of nodes present on layer `l`
    pub layer_sizes: Vec<usize>,
}

/// Multi-layer navigable small-world graph
#[derive(Debug, Clone)]
pub struct HnswGraph {
    pub(super) params: GraphParams,
    /// `[node][layer] -> neighbour ids`
    pub(super) neighbors: Vec<Vec<Vec<InternalId>>>,
    pub(super) levels: Vec<u8>,
    pub(super) entry_point: Option<InternalId>,
    pub(super) max_layer: usize,
    rng: StdRng,
}

impl HnswGraph {
    pub fn new(params: GraphParams, seed: u64) -> Self {
        Self {
            params,
            neighbors: Vec::new(),
            levels: Vec::new(),
            entry_point: None,
            max_layer: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self::new(GraphParams::from_config(config), config.seed)
    }

    pub fn params(&self) -> &GraphParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn entry_point(&self) -> Option<InternalId> {
        self.entry_point
    }

    /// Highest occupied layer (0 for an empty graph)
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Top layer of `id`, if present
    pub fn level(&self, id: InternalId) -> Option<usize> {
        self.levels.get(id as usize).map(|&l| l as usize)
    }

    /// Neighbours of `id` on `layer`; empty when the node is absent there
    #[inline]
    pub fn neighbors(&self, id: InternalId, layer: usize) -> &[InternalId] {
        self.neighbors
            .get(id as usize)
            .and_then(|layers| layers.get(layer))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Draw a top layer: `floor(-ln(U) * level_mult)`, capped at `max_level`
    pub(super) fn random_level(&mut self) -> usize {
        // gen() is in [0, 1); flip it so ln never sees 0
        let r: f64 = 1.0 - self.rng.gen::<f64>();
        let level = (-r.ln() * self.params.level_mult).floor() as usize;
        level.min(self.params.max_level)
    }

    /// Append a node with the given per-layer links
    pub(super) fn push_node(&mut self, level: usize, links: Vec<Vec<InternalId>>) {
        debug_assert_eq!(links.len(), level + 1);
        self.neighbors.push(links);
        self.levels.push(level as u8);
    }

    pub fn stats(&self) -> GraphStats {
        let mut layer_sizes = vec![0usize; if self.is_empty() { 0 } else { self.max_layer + 1 }];
        let mut total_edges = 0;
        for layers in &self.neighbors {
            for (layer, links) in layers.iter().enumerate() {
                total_edges += links.len();
                if let Some(count) = layer_sizes.get_mut(layer) {
                    *count += 1;
                }
            }
        }

        let layer0_edges: usize = self
            .neighbors
            .iter()
            .map(|layers| layers.first().map_or(0, Vec::len))
            .sum();
        let avg_degree = if self.is_empty() {
            0.0
        } else {
            layer0_edges as f32 / self.len() as f32
        };

        GraphStats {
            node_count: self.len(),
            max_layer: self.max_layer,
            entry_point: self.entry_point,
            total_edges,
            avg_degree,
            layer_sizes,
        }
    }
}
