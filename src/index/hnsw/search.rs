//! HNSW search: greedy descent, single-layer beam search and multi-layer KNN
//!
//! All orderings are by `(distance, id)` so equal distances resolve the same
//! way on every run.

use super::graph::{HnswGraph, VectorSource};
use super::visited::{with_visited, VisitedSet};
use crate::distance::DistanceMetric;
use crate::types::{InternalId, Neighbor};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Heap entry ordered by distance, then id
type Scored = (OrderedFloat<f32>, InternalId);

impl HnswGraph {
    /// Walk `layer` greedily from `start`, always moving to a strictly closer
    /// neighbour, until no neighbour improves on the current node.
    pub fn greedy_closest<V: VectorSource + ?Sized>(
        &self,
        vectors: &V,
        metric: &dyn DistanceMetric,
        query: &[f32],
        start: Neighbor,
        layer: usize,
    ) -> Neighbor {
        let mut current = start;
        loop {
            let mut changed = false;
            for &candidate in self.neighbors(current.id, layer) {
                let dist = metric.distance(query, vectors.vector(candidate));
                if dist < current.distance {
                    current = Neighbor::new(candidate, dist);
                    changed = true;
                }
            }
            if !changed {
                return current;
            }
        }
    }

    /// Beam search on one layer
    ///
    /// Keeps the `ef` best nodes seen so far; stops once the closest open
    /// candidate is farther than the worst kept node and the beam is full.
    /// Returns at most `ef` nodes, ascending.
    #[allow(clippy::too_many_arguments)]
    pub fn search_layer<V: VectorSource + ?Sized>(
        &self,
        vectors: &V,
        metric: &dyn DistanceMetric,
        query: &[f32],
        entry_points: &[InternalId],
        ef: usize,
        layer: usize,
        visited: &mut VisitedSet,
    ) -> Vec<Neighbor> {
        let ef = ef.max(1);
        visited.start_pass();

        // the beam can never hold more than every node
        let reserve = ef.min(self.len().max(1));
        let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(reserve * 2);
        let mut results: BinaryHeap<Scored> = BinaryHeap::with_capacity(reserve + 1);

        for &ep in entry_points {
            if visited.mark(ep) {
                let scored = (OrderedFloat(metric.distance(query, vectors.vector(ep))), ep);
                candidates.push(Reverse(scored));
                results.push(scored);
                if results.len() > ef {
                    results.pop();
                }
            }
        }

        while let Some(Reverse((dist, id))) = candidates.pop() {
            if results.len() >= ef {
                if let Some(&(worst, _)) = results.peek() {
                    if dist > worst {
                        break;
                    }
                }
            }

            for &neighbor in self.neighbors(id, layer) {
                if !visited.mark(neighbor) {
                    continue;
                }

                let scored = (
                    OrderedFloat(metric.distance(query, vectors.vector(neighbor))),
                    neighbor,
                );
                let admit = results.len() < ef || results.peek().map_or(true, |worst| scored < *worst);
                if admit {
                    candidates.push(Reverse(scored));
                    results.push(scored);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results
            .into_sorted_vec()
            .into_iter()
            .map(|(dist, id)| Neighbor::new(id, dist.0))
            .collect()
    }

    /// Multi-layer KNN search
    ///
    /// Greedy descent to layer 1, then a beam of `max(ef, k)` on layer 0,
    /// clamped to the node count. Returns up to that many candidates
    /// ascending by distance; an empty graph gives an empty result.
    pub fn knn_search<V: VectorSource + ?Sized>(
        &self,
        vectors: &V,
        metric: &dyn DistanceMetric,
        query: &[f32],
        k: usize,
        ef: usize,
    ) -> Vec<Neighbor> {
        let entry_point = match self.entry_point {
            Some(ep) => ep,
            None => return Vec::new(),
        };

        let mut current = Neighbor::new(
            entry_point,
            metric.distance(query, vectors.vector(entry_point)),
        );
        for layer in (1..=self.max_layer).rev() {
            current = self.greedy_closest(vectors, metric, query, current, layer);
        }

        let ef = ef.max(k).min(self.len());
        with_visited(self.len(), |visited| {
            self.search_layer(vectors, metric, query, &[current.id], ef, 0, visited)
        })
    }

    /// Exhaustive scan, ascending by distance. Used to measure recall.
    pub fn brute_force<V: VectorSource + ?Sized>(
        &self,
        vectors: &V,
        metric: &dyn DistanceMetric,
        query: &[f32],
        k: usize,
    ) -> Vec<Neighbor> {
        let mut all: Vec<Neighbor> = (0..self.len() as InternalId)
            .map(|id| Neighbor::new(id, metric.distance(query, vectors.vector(id))))
            .collect();
        all.sort_by(super::pruner::cmp_neighbors);
        all.truncate(k);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::super::graph::tests::VecSource;
    use super::*;
    use crate::config::IndexConfig;
    use crate::distance::SquaredEuclidean;

    /// Hand-wired single-layer graph: a path 0 - 1 - 2 - 3 - 4 on a line
    fn line_graph() -> (HnswGraph, VecSource) {
        let mut graph = HnswGraph::from_config(&IndexConfig::new(1).with_m(2));
        let vectors = VecSource((0..5).map(|i| vec![i as f32]).collect());
        for id in 0..5u32 {
            let mut links = Vec::new();
            if id > 0 {
                links.push(id - 1);
            }
            if id < 4 {
                links.push(id + 1);
            }
            graph.push_node(0, vec![links]);
        }
        graph.entry_point = Some(0);
        (graph, vectors)
    }

    #[test]
    fn test_greedy_walks_to_closest() {
        let (graph, vectors) = line_graph();
        let start = Neighbor::new(0, 16.0);
        let found = graph.greedy_closest(&vectors, &SquaredEuclidean, &[3.9], start, 0);
        assert_eq!(found.id, 4);
    }

    #[test]
    fn test_search_layer_respects_ef() {
        let (graph, vectors) = line_graph();
        let mut visited = VisitedSet::new(graph.len());

        let found = graph.search_layer(&vectors, &SquaredEuclidean, &[2.0], &[0], 3, 0, &mut visited);
        let ids: Vec<_> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_search_layer_ties_by_id() {
        let (graph, vectors) = line_graph();
        let mut visited = VisitedSet::new(graph.len());

        // 1 and 3 are both at distance 1 from the query
        let found = graph.search_layer(&vectors, &SquaredEuclidean, &[2.0], &[4], 5, 0, &mut visited);
        let ids: Vec<_> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 0, 4]);
    }

    #[test]
    fn test_knn_on_empty_graph() {
        let graph = HnswGraph::from_config(&IndexConfig::new(2));
        let vectors = VecSource(Vec::new());
        assert!(graph.knn_search(&vectors, &SquaredEuclidean, &[0.0, 0.0], 3, 10).is_empty());
    }

    #[test]
    fn test_knn_ef_at_least_k() {
        let (graph, vectors) = line_graph();
        let found = graph.knn_search(&vectors, &SquaredEuclidean, &[0.0], 4, 1);
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].id, 0);
    }

    #[test]
    fn test_knn_huge_k_returns_every_node() {
        let (graph, vectors) = line_graph();
        for k in [usize::MAX, 1 << 40] {
            let found = graph.knn_search(&vectors, &SquaredEuclidean, &[1.0], k, k);
            assert_eq!(found.len(), 5);
            assert_eq!(found[0].id, 1);
        }

        let mut visited = VisitedSet::new(graph.len());
        let found = graph.search_layer(&vectors, &SquaredEuclidean, &[0.0], &[0], usize::MAX, 0, &mut visited);
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_brute_force_order() {
        let (graph, vectors) = line_graph();
        let found = graph.brute_force(&vectors, &SquaredEuclidean, &[3.0], 2);
        assert_eq!(found, vec![Neighbor::new(3, 0.0), Neighbor::new(2, 1.0)]);
    }
}
