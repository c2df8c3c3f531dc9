//! HNSW insertion
//!
//! 1. Draw a top layer for the new node.
//! 2. Descend greedily to that layer.
//! 3. On each layer from there to 0, beam-search with `ef_construction` and
//!    link to at most `m` neighbours picked by [`select_neighbors`].
//! 4. Add reverse edges, re-pruning lists that overflow their cap.

use super::graph::{HnswGraph, VectorSource};
use super::pruner::{select_neighbors, DEFAULT_ALPHA};
use super::visited::with_visited;
use crate::distance::DistanceMetric;
use crate::types::{InternalId, Neighbor};
use crate::{IndexError, Result};
use tracing::trace;

impl HnswGraph {
    /// Insert node `id` whose vector is already readable through `vectors`
    ///
    /// `id` must be the next dense id (`== self.len()`); anything else is an
    /// internal-consistency error and leaves the graph untouched.
    pub fn insert<V: VectorSource + ?Sized>(
        &mut self,
        id: InternalId,
        vectors: &V,
        metric: &dyn DistanceMetric,
    ) -> Result<()> {
        if id as usize != self.len() {
            return Err(IndexError::UnknownId(id));
        }

        let level = self.random_level();

        let entry_point = match self.entry_point {
            Some(ep) => ep,
            None => {
                self.push_node(level, vec![Vec::new(); level + 1]);
                self.entry_point = Some(id);
                self.max_layer = level;
                trace!(id, level, "first node becomes entry point");
                return Ok(());
            }
        };

        let query = vectors.vector(id);
        let links = self.plan_links(vectors, metric, query, entry_point, level);
        self.push_node(level, links);
        self.link_back(id, vectors, metric);

        if level > self.max_layer {
            trace!(id, level, previous = self.max_layer, "new entry point");
            self.max_layer = level;
            self.entry_point = Some(id);
        }

        Ok(())
    }

    /// Forward links for a node of `level`, one list per layer
    fn plan_links<V: VectorSource + ?Sized>(
        &self,
        vectors: &V,
        metric: &dyn DistanceMetric,
        query: &[f32],
        entry_point: InternalId,
        level: usize,
    ) -> Vec<Vec<InternalId>> {
        let mut current = Neighbor::new(entry_point, metric.distance(query, vectors.vector(entry_point)));
        for layer in (level + 1..=self.max_layer).rev() {
            current = self.greedy_closest(vectors, metric, query, current, layer);
        }

        let top = level.min(self.max_layer);
        let mut links: Vec<Vec<InternalId>> = vec![Vec::new(); level + 1];
        let mut layer_eps = vec![current.id];

        with_visited(self.len() + 1, |visited| {
            for layer in (0..=top).rev() {
                let candidates = self.search_layer(
                    vectors,
                    metric,
                    query,
                    &layer_eps,
                    self.params.ef_construction,
                    layer,
                    visited,
                );

                let selected = select_neighbors(
                    &candidates,
                    self.params.m,
                    DEFAULT_ALPHA,
                    |a, b| metric.distance(vectors.vector(a), vectors.vector(b)),
                    |a, b| vectors.vector(a) == vectors.vector(b),
                );
                links[layer] = selected.iter().map(|n| n.id).collect();

                layer_eps = candidates.iter().map(|n| n.id).collect();
                if layer_eps.is_empty() {
                    layer_eps.push(current.id);
                }
            }
        });

        links
    }

    /// Add `id` to the lists of its own neighbours, pruning any list that
    /// grows past its cap
    fn link_back<V: VectorSource + ?Sized>(
        &mut self,
        id: InternalId,
        vectors: &V,
        metric: &dyn DistanceMetric,
    ) {
        let own_links = self.neighbors[id as usize].clone();

        for (layer, targets) in own_links.iter().enumerate() {
            let cap = self.params.max_links(layer);

            for &target in targets {
                let Some(list) = self.neighbors[target as usize].get_mut(layer) else {
                    continue;
                };
                if list.contains(&id) {
                    continue;
                }
                if list.len() < cap {
                    list.push(id);
                    continue;
                }

                let base = vectors.vector(target);
                let candidates: Vec<Neighbor> = list
                    .iter()
                    .copied()
                    .chain(std::iter::once(id))
                    .map(|other| Neighbor::new(other, metric.distance(base, vectors.vector(other))))
                    .collect();

                let pruned = select_neighbors(
                    &candidates,
                    cap,
                    DEFAULT_ALPHA,
                    |a, b| metric.distance(vectors.vector(a), vectors.vector(b)),
                    |a, b| vectors.vector(a) == vectors.vector(b),
                );
                self.neighbors[target as usize][layer] = pruned.into_iter().map(|n| n.id).collect();
            }
        }
    }
}
