//! Index configuration and per-query options
//!
//! [`IndexConfig`] is fixed when the index is created. [`QueryOptions`] carries
//! the knobs that may change from one query to the next.

use crate::distance::DistanceKind;
use crate::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Default number of links per node on upper layers.
pub const DEFAULT_M: usize = 16;

/// Default candidate list size while building the graph.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default baseline candidate list size at query time (hnswlib's `ef = 10`).
pub const DEFAULT_EF_SEARCH: usize = 10;

/// Baseline ef is at least `k * DEFAULT_EF_MULTIPLIER`, so a moderate share of
/// duplicate keys is absorbed without a widening round.
pub const DEFAULT_EF_MULTIPLIER: usize = 2;

/// Widening never pushes ef past `len * DEFAULT_EF_CEILING_FACTOR`.
pub const DEFAULT_EF_CEILING_FACTOR: usize = 2;

/// Highest layer a node can be promoted to.
pub const DEFAULT_MAX_LEVEL: usize = 16;

/// Seed for level assignment (hnswlib's `random_seed = 100`).
pub const DEFAULT_SEED: u64 = 100;

fn default_m() -> usize {
    DEFAULT_M
}

fn default_ef_construction() -> usize {
    DEFAULT_EF_CONSTRUCTION
}

fn default_ef_search() -> usize {
    DEFAULT_EF_SEARCH
}

fn default_ef_multiplier() -> usize {
    DEFAULT_EF_MULTIPLIER
}

fn default_ef_ceiling_factor() -> usize {
    DEFAULT_EF_CEILING_FACTOR
}

fn default_max_level() -> usize {
    DEFAULT_MAX_LEVEL
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Construction-time index parameters
///
/// Every field except `dimension` has a default, so a JSON document only
/// needs to name what it changes:
///
/// ```
/// use keyann::IndexConfig;
///
/// let config = IndexConfig::from_json(r#"{ "dimension": 128, "m": 32 }"#).unwrap();
/// assert_eq!(config.m_max0, 64);
/// assert_eq!(config.ef_construction, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Length of every stored and queried vector
    pub dimension: usize,

    /// Maximum links per node on layers above 0
    #[serde(default = "default_m")]
    pub m: usize,

    /// Maximum links per node on layer 0 (`2 * m` unless set)
    #[serde(default)]
    pub m_max0: usize,

    /// Candidate list size during insertion
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,

    /// Baseline candidate list size during queries
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,

    /// Baseline ef is at least `k * ef_multiplier`
    #[serde(default = "default_ef_multiplier")]
    pub ef_multiplier: usize,

    /// Widening stops at `len * ef_ceiling_factor`
    #[serde(default = "default_ef_ceiling_factor")]
    pub ef_ceiling_factor: usize,

    /// Optional hard limit on stored vectors
    #[serde(default)]
    pub max_elements: Option<usize>,

    /// Built-in metric used unless a custom one is supplied
    #[serde(default)]
    pub metric: DistanceKind,

    /// Highest layer a node may be promoted to
    #[serde(default = "default_max_level")]
    pub max_level: usize,

    /// Seed for the level generator
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl IndexConfig {
    /// Create a configuration with default tuning for `dimension`
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            m: DEFAULT_M,
            m_max0: DEFAULT_M * 2,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_search: DEFAULT_EF_SEARCH,
            ef_multiplier: DEFAULT_EF_MULTIPLIER,
            ef_ceiling_factor: DEFAULT_EF_CEILING_FACTOR,
            max_elements: None,
            metric: DistanceKind::default(),
            max_level: DEFAULT_MAX_LEVEL,
            seed: DEFAULT_SEED,
        }
    }

    /// Smaller graph and cheaper builds for memory-constrained hosts
    pub fn embedded(dimension: usize) -> Self {
        let m = if dimension <= 128 { 8 } else { 12 };
        Self {
            m,
            m_max0: m * 2,
            ef_construction: 100,
            ..Self::new(dimension)
        }
    }

    /// Denser graph and wider searches for recall-sensitive workloads
    pub fn high_recall(dimension: usize) -> Self {
        let m = if dimension <= 128 { 32 } else { 48 };
        Self {
            m,
            m_max0: m * 2,
            ef_construction: 400,
            ef_search: 64,
            ef_multiplier: 4,
            ..Self::new(dimension)
        }
    }

    /// Set `m` and reset `m_max0` to `2 * m`
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self.m_max0 = m * 2;
        self
    }

    pub fn with_m_max0(mut self, m_max0: usize) -> Self {
        self.m_max0 = m_max0;
        self
    }

    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = ef_search;
        self
    }

    pub fn with_ef_multiplier(mut self, ef_multiplier: usize) -> Self {
        self.ef_multiplier = ef_multiplier;
        self
    }

    pub fn with_ef_ceiling_factor(mut self, ef_ceiling_factor: usize) -> Self {
        self.ef_ceiling_factor = ef_ceiling_factor;
        self
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = Some(max_elements);
        self
    }

    pub fn with_metric(mut self, metric: DistanceKind) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fill derived fields left at zero by deserialization
    fn normalized(mut self) -> Self {
        if self.m_max0 == 0 {
            self.m_max0 = self.m * 2;
        }
        self
    }

    /// Reject parameters the graph cannot work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(IndexError::InvalidConfiguration(msg));

        if self.dimension == 0 {
            return invalid("dimension must be at least 1".to_string());
        }
        if self.m == 0 {
            return invalid("m must be at least 1".to_string());
        }
        if self.m_max0 < self.m {
            return invalid(format!(
                "m_max0 ({}) must not be smaller than m ({})",
                self.m_max0, self.m
            ));
        }
        if self.ef_construction == 0 {
            return invalid("ef_construction must be at least 1".to_string());
        }
        if self.ef_search == 0 {
            return invalid("ef_search must be at least 1".to_string());
        }
        if self.ef_multiplier == 0 {
            return invalid("ef_multiplier must be at least 1".to_string());
        }
        if self.ef_ceiling_factor == 0 {
            return invalid("ef_ceiling_factor must be at least 1".to_string());
        }
        if self.max_elements == Some(0) {
            return invalid("max_elements must be at least 1 when set".to_string());
        }
        if self.max_level > u8::MAX as usize {
            return invalid(format!("max_level must not exceed {}", u8::MAX));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Per-query parameters for the deduplicated search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Number of distinct keys requested
    pub k: usize,

    /// Override for the baseline ef
    #[serde(default)]
    pub ef: Option<usize>,

    /// Caller-imposed upper bound on ef, applied on top of the index ceiling.
    /// Bounding ef is how a caller trades completeness for latency.
    #[serde(default)]
    pub max_ef: Option<usize>,
}

impl QueryOptions {
    pub fn new(k: usize) -> Self {
        Self { k, ef: None, max_ef: None }
    }

    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = Some(ef);
        self
    }

    pub fn with_max_ef(mut self, max_ef: usize) -> Self {
        self.max_ef = Some(max_ef);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::new(10);
        assert_eq!(config.m, 16);
        assert_eq!(config.m_max0, 32);
        assert_eq!(config.ef_construction, 200);
        assert_eq!(config.metric, DistanceKind::SquaredEuclidean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        let embedded = IndexConfig::embedded(384);
        assert!(embedded.m < DEFAULT_M);
        assert!(embedded.validate().is_ok());

        let recall = IndexConfig::high_recall(64);
        assert!(recall.m > DEFAULT_M);
        assert!(recall.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let cases = vec![
            IndexConfig::new(0),
            IndexConfig::new(4).with_m(0),
            IndexConfig::new(4).with_m(16).with_m_max0(8),
            IndexConfig::new(4).with_ef_construction(0),
            IndexConfig::new(4).with_ef_search(0),
            IndexConfig::new(4).with_ef_multiplier(0),
            IndexConfig::new(4).with_ef_ceiling_factor(0),
            IndexConfig::new(4).with_max_elements(0),
            IndexConfig::new(4).with_max_level(300),
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(IndexError::InvalidConfiguration(_))),
                "accepted {:?}",
                config
            );
        }
    }

    #[test]
    fn test_m_of_one_is_valid() {
        assert!(IndexConfig::new(4).with_m(1).validate().is_ok());
    }

    #[test]
    fn test_json_partial_document() {
        let config = IndexConfig::from_json(r#"{"dimension": 8, "m": 4, "metric": "cosine"}"#).unwrap();
        assert_eq!(config.m, 4);
        assert_eq!(config.m_max0, 8);
        assert_eq!(config.metric, DistanceKind::Cosine);
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_json_rejects_invalid() {
        assert!(matches!(
            IndexConfig::from_json(r#"{"dimension": 0}"#),
            Err(IndexError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            IndexConfig::from_json(r#"{"m": 4}"#),
            Err(IndexError::Serialization(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_fields() {
        let config = IndexConfig::new(32).with_max_elements(1000).with_seed(7);
        let parsed = IndexConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_query_options() {
        let opts = QueryOptions::new(5).with_ef(40).with_max_ef(80);
        assert_eq!(opts.k, 5);
        assert_eq!(opts.ef, Some(40));
        assert_eq!(opts.max_ef, Some(80));
    }
}
