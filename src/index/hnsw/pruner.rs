//! Diversity-aware neighbour selection
//!
//! A candidate is kept only if it is closer to the base node than to every
//! neighbour kept before it (HNSW heuristic; Vamana robust prune with
//! `alpha = 1.0`), and is not an exact copy of one of them. When that leaves
//! free slots, the nearest rejected candidates fill them.
//!
//! The copy rule matters for keyed data: many identical vectors would
//! otherwise all look diverse to each other (`0 >= 0`), fill every list in
//! their cluster, and leave the cluster with no edges out of it.

use crate::types::{InternalId, Neighbor};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// Diversity factor for HNSW graphs
pub const DEFAULT_ALPHA: f32 = 1.0;

/// Ascending by distance, ties by ascending id
#[inline]
pub fn cmp_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    OrderedFloat(a.distance)
        .cmp(&OrderedFloat(b.distance))
        .then(a.id.cmp(&b.id))
}

/// Select at most `max_degree` neighbours out of `candidates`
///
/// # Arguments
/// * `candidates` - Candidates with their distance to the base node
/// * `max_degree` - Maximum number of neighbours to keep
/// * `alpha` - Diversity factor (1.0 for HNSW)
/// * `distance_fn` - Distance between two stored nodes
/// * `same_point` - Whether two stored nodes hold identical vectors
///
/// # Returns
/// Selected neighbours; diverse picks first, back-filled picks after them
pub fn select_neighbors<F, S>(
    candidates: &[Neighbor],
    max_degree: usize,
    alpha: f32,
    distance_fn: F,
    same_point: S,
) -> Vec<Neighbor>
where
    F: Fn(InternalId, InternalId) -> f32,
    S: Fn(InternalId, InternalId) -> bool,
{
    let mut sorted = candidates.to_vec();
    sorted.sort_by(cmp_neighbors);
    sorted.dedup_by_key(|c| c.id);

    if sorted.len() <= max_degree {
        return sorted;
    }

    let mut selected: Vec<Neighbor> = Vec::with_capacity(max_degree);
    let mut rejected: Vec<Neighbor> = Vec::new();

    for candidate in sorted {
        if selected.len() >= max_degree {
            break;
        }

        let is_diverse = selected.iter().all(|kept| {
            let dist_to_kept = distance_fn(candidate.id, kept.id);
            dist_to_kept >= alpha * candidate.distance && !same_point(candidate.id, kept.id)
        });

        if is_diverse {
            selected.push(candidate);
        } else {
            rejected.push(candidate);
        }
    }

    // rejected is already in ascending order
    let free = max_degree - selected.len();
    selected.extend(rejected.into_iter().take(free));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: InternalId, distance: f32) -> Neighbor {
        Neighbor::new(id, distance)
    }

    #[test]
    fn test_cmp_breaks_ties_by_id() {
        let mut list = vec![n(5, 1.0), n(2, 1.0), n(9, 0.5)];
        list.sort_by(cmp_neighbors);
        let ids: Vec<_> = list.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[test]
    fn test_no_pruning_needed() {
        let candidates = vec![n(1, 2.0), n(2, 1.0)];
        let selected = select_neighbors(&candidates, 5, DEFAULT_ALPHA, |_, _| 0.0, |_, _| false);
        assert_eq!(selected, vec![n(2, 1.0), n(1, 2.0)]);
    }

    #[test]
    fn test_prefers_diverse_neighbors() {
        let candidates = vec![n(1, 1.0), n(2, 1.1), n(3, 5.0)];

        // 1 and 2 sit next to each other, everything else is far apart
        let dist_fn = |a: InternalId, b: InternalId| {
            if (a == 1 && b == 2) || (a == 2 && b == 1) {
                0.5
            } else {
                10.0
            }
        };

        let selected = select_neighbors(&candidates, 2, DEFAULT_ALPHA, dist_fn, |_, _| false);
        let ids: Vec<_> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_backfills_with_nearest_rejected() {
        // four exact duplicates of each other plus one far node
        let candidates = vec![n(1, 1.0), n(2, 1.0), n(3, 1.0), n(4, 1.0), n(5, 9.0)];
        let dist_fn = |a: InternalId, b: InternalId| if a == 5 || b == 5 { 10.0 } else { 0.0 };
        let same = |a: InternalId, b: InternalId| a != 5 && b != 5;

        let selected = select_neighbors(&candidates, 3, DEFAULT_ALPHA, dist_fn, same);
        let ids: Vec<_> = selected.iter().map(|c| c.id).collect();
        // 1 and 5 are diverse, 2 is the nearest rejected
        assert_eq!(ids, vec![1, 5, 2]);
    }

    #[test]
    fn test_copies_of_base_do_not_crowd_out_others() {
        // base has 8 exact copies at distance 0 and one real neighbour
        let mut candidates: Vec<Neighbor> = (1..=8).map(|id| n(id, 0.0)).collect();
        candidates.push(n(20, 2.0));
        let dist_fn = |a: InternalId, b: InternalId| if a == 20 || b == 20 { 2.0 } else { 0.0 };
        let same = |a: InternalId, b: InternalId| a != 20 && b != 20;

        let selected = select_neighbors(&candidates, 8, DEFAULT_ALPHA, dist_fn, same);
        let ids: Vec<_> = selected.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(&ids[..2], &[1, 20]);

        // without the copy rule every copy passes `0 >= 0`
        let plain = select_neighbors(&candidates, 8, DEFAULT_ALPHA, dist_fn, |_, _| false);
        assert!(!plain.iter().any(|c| c.id == 20));
    }

    #[test]
    fn test_duplicate_candidate_ids_collapse() {
        let candidates = vec![n(4, 1.0), n(4, 1.0), n(7, 2.0)];
        let selected = select_neighbors(&candidates, 1, DEFAULT_ALPHA, |_, _| 1.0, |_, _| false);
        assert_eq!(selected, vec![n(4, 1.0)]);
    }
}
