//! Deduplicated top-k search
//!
//! The graph returns raw nearest neighbours; several of them may share a key.
//! [`DedupSearcher`] keeps the closest hit per key and, while it still has
//! fewer than `k` keys and the beam came back full, doubles `ef` and searches
//! again. Widening stops at a ceiling, so a query over a heavily duplicated
//! index degrades to fewer results instead of scanning forever.

use crate::config::{IndexConfig, QueryOptions};
use crate::distance::DistanceMetric;
use crate::index::{HnswGraph, VectorStore};
use crate::types::{Key, Neighbor, SearchHit};
use crate::{IndexError, Result};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why the widening loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// `k` distinct keys collected
    Complete,
    /// The graph returned fewer candidates than `ef`; nothing more to find
    Exhausted,
    /// `ef` hit the ceiling with keys still missing
    CeilingReached,
}

/// Result of a deduplicated query plus how it was reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupOutcome<K> {
    /// At most `k` hits, keys pairwise distinct, ascending by distance
    pub hits: Vec<SearchHit<K>>,
    pub termination: Termination,
    /// ef used by the last search round (0 when no search ran)
    pub final_ef: usize,
    /// Number of graph searches issued
    pub rounds: usize,
}

impl<K> DedupOutcome<K> {
    fn empty(termination: Termination) -> Self {
        Self {
            hits: Vec::new(),
            termination,
            final_ef: 0,
            rounds: 0,
        }
    }

    /// True when fewer hits than requested came back
    pub fn is_degraded(&self) -> bool {
        self.termination != Termination::Complete
    }
}

/// Runs deduplicated queries against a borrowed store and graph
///
/// Holds no state of its own; callers construct one per query under whatever
/// lock protects the store and graph.
pub struct DedupSearcher<'a, K: Key> {
    store: &'a VectorStore<K>,
    graph: &'a HnswGraph,
    metric: &'a dyn DistanceMetric,
    config: &'a IndexConfig,
}

impl<'a, K: Key> DedupSearcher<'a, K> {
    pub fn new(
        store: &'a VectorStore<K>,
        graph: &'a HnswGraph,
        metric: &'a dyn DistanceMetric,
        config: &'a IndexConfig,
    ) -> Self {
        Self {
            store,
            graph,
            metric,
            config,
        }
    }

    /// Starting ef: `max(k, options.ef or max(ef_search, k * ef_multiplier))`
    pub fn initial_ef(&self, options: &QueryOptions) -> usize {
        let k = options.k;
        let baseline = options.ef.unwrap_or_else(|| {
            self.config
                .ef_search
                .max(k.saturating_mul(self.config.ef_multiplier))
        });
        baseline.max(k)
    }

    /// Largest ef the loop may reach
    ///
    /// `len * ef_ceiling_factor`, never below the starting ef, then lowered
    /// by `options.max_ef` (but never below `k`). The graph clamps each beam
    /// to its node count, so a huge value here costs no more than a full scan.
    pub fn ef_ceiling(&self, options: &QueryOptions) -> usize {
        let initial = self.initial_ef(options);
        let ceiling = self
            .store
            .len()
            .saturating_mul(self.config.ef_ceiling_factor)
            .max(initial);
        match options.max_ef {
            Some(max_ef) => ceiling.min(max_ef.max(options.k)),
            None => ceiling,
        }
    }

    /// Top `options.k` hits with pairwise distinct keys
    pub fn search(&self, query: &[f32], options: &QueryOptions) -> Result<DedupOutcome<K>> {
        if query.len() != self.store.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: self.store.dimension(),
                actual: query.len(),
            });
        }

        let k = options.k;
        if k == 0 {
            return Ok(DedupOutcome::empty(Termination::Complete));
        }
        if self.graph.is_empty() {
            return Ok(DedupOutcome::empty(Termination::Exhausted));
        }

        let ceiling = self.ef_ceiling(options);
        let mut ef = self.initial_ef(options).min(ceiling);
        let mut rounds = 0;

        loop {
            rounds += 1;
            let raw = self.graph.knn_search(self.store, self.metric, query, k, ef);
            let hits = self.collect_distinct(&raw, k)?;

            let termination = if hits.len() >= k {
                Some(Termination::Complete)
            } else if raw.len() < ef {
                Some(Termination::Exhausted)
            } else if ef >= ceiling {
                Some(Termination::CeilingReached)
            } else {
                None
            };

            if let Some(termination) = termination {
                if termination != Termination::Complete {
                    debug!(
                        k,
                        found = hits.len(),
                        ef,
                        rounds,
                        ?termination,
                        "dedup query returned fewer keys than requested"
                    );
                }
                return Ok(DedupOutcome {
                    hits,
                    termination,
                    final_ef: ef,
                    rounds,
                });
            }

            let next = ef.saturating_mul(2).min(ceiling);
            debug!(k, found = hits.len(), ef, next, "widening dedup query");
            ef = next;
        }
    }

    /// First hit per key from an ascending candidate list, up to `k` keys
    fn collect_distinct(&self, raw: &[Neighbor], k: usize) -> Result<Vec<SearchHit<K>>> {
        let reserve = k.min(raw.len());
        let mut seen: AHashSet<&K> = AHashSet::with_capacity(reserve);
        let mut hits = Vec::with_capacity(reserve);

        for neighbor in raw {
            let key = self.store.get_key(neighbor.id)?;
            if seen.insert(key) {
                hits.push(SearchHit {
                    key: key.clone(),
                    distance: neighbor.distance,
                    id: neighbor.id,
                });
                if hits.len() == k {
                    break;
                }
            }
        }
        Ok(hits)
    }
}
