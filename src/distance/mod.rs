//! Distance metrics for vector similarity computation
//!
//! Every metric returns a value where lower means closer. The graph and the
//! query layer only ever talk to [`DistanceMetric`], so callers can plug in
//! their own function.

pub mod cosine;
pub mod euclidean;
pub mod inner_product;

pub use cosine::{cosine_distance, cosine_similarity};
pub use euclidean::{euclidean_distance, euclidean_distance_squared};
pub use inner_product::{dot_product, inner_product_distance};

use serde::{Deserialize, Serialize};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
#[cfg(target_arch = "x86_64")]
use std::sync::OnceLock;

/// Distance metric trait
///
/// Implementations must be pure, symmetric and total: the same pair of
/// vectors always yields the same finite value.
pub trait DistanceMetric: Send + Sync {
    /// Compute distance between two vectors of equal length
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

impl<F> DistanceMetric for F
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}

/// Squared Euclidean distance (L2²), the `l2` space of hnswlib
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl DistanceMetric for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        euclidean_distance_squared(a, b)
    }
}

/// Euclidean distance (L2)
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceMetric for Euclidean {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        euclidean_distance(a, b)
    }
}

/// Inner-product distance (`1 - a·b`)
#[derive(Debug, Clone, Copy, Default)]
pub struct InnerProduct;

impl DistanceMetric for InnerProduct {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        inner_product_distance(a, b)
    }
}

/// Cosine distance (`1 - cosine_similarity`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl DistanceMetric for Cosine {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_distance(a, b)
    }
}

/// Serializable selector for the built-in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    #[default]
    SquaredEuclidean,
    Euclidean,
    InnerProduct,
    Cosine,
}

impl DistanceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SquaredEuclidean => "squared_euclidean",
            Self::Euclidean => "euclidean",
            Self::InnerProduct => "inner_product",
            Self::Cosine => "cosine",
        }
    }
}

impl DistanceMetric for DistanceKind {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::SquaredEuclidean => euclidean_distance_squared(a, b),
            Self::Euclidean => euclidean_distance(a, b),
            Self::InnerProduct => inner_product_distance(a, b),
            Self::Cosine => cosine_distance(a, b),
        }
    }
}

/// AVX2 availability, detected once per process
#[cfg(target_arch = "x86_64")]
static HAS_AVX2: OnceLock<bool> = OnceLock::new();

#[cfg(target_arch = "x86_64")]
#[inline]
pub(crate) fn has_avx2() -> bool {
    *HAS_AVX2.get_or_init(|| is_x86_feature_detected!("avx2"))
}

/// Sum the eight lanes of an AVX register
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn horizontal_sum_avx2(v: __m256) -> f32 {
    let high = _mm256_extractf128_ps(v, 1);
    let low = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(high, low);

    let shuf = _mm_movehdup_ps(sum128);
    let sum64 = _mm_add_ps(sum128, shuf);
    let shuf2 = _mm_movehl_ps(shuf, sum64);
    let sum32 = _mm_add_ss(sum64, shuf2);

    _mm_cvtss_f32(sum32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_euclidean_metric() {
        let metric = SquaredEuclidean;
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        assert!((metric.distance(&a, &b) - 27.0).abs() < 0.001);
    }

    #[test]
    fn test_euclidean_metric() {
        let metric = Euclidean;
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        let dist = metric.distance(&a, &b);
        assert!((dist - 5.196152).abs() < 0.001);
    }

    #[test]
    fn test_cosine_metric() {
        let metric = Cosine;
        let a = vec![1.0, 0.0, 0.0];
        let dist = metric.distance(&a, &a);
        assert!(dist < 0.01); // Same vector should have ~0 distance
    }

    #[test]
    fn test_kind_matches_structs() {
        let a: Vec<f32> = (0..19).map(|i| i as f32 * 0.1).collect();
        let b: Vec<f32> = (0..19).map(|i| 1.0 - i as f32 * 0.05).collect();

        assert_eq!(DistanceKind::SquaredEuclidean.distance(&a, &b), SquaredEuclidean.distance(&a, &b));
        assert_eq!(DistanceKind::Euclidean.distance(&a, &b), Euclidean.distance(&a, &b));
        assert_eq!(DistanceKind::InnerProduct.distance(&a, &b), InnerProduct.distance(&a, &b));
        assert_eq!(DistanceKind::Cosine.distance(&a, &b), Cosine.distance(&a, &b));
    }

    #[test]
    fn test_closure_metric() {
        let manhattan = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        };
        assert_eq!(manhattan.distance(&[0.0, 0.0], &[1.0, -2.0]), 3.0);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&DistanceKind::InnerProduct).unwrap();
        assert_eq!(json, "\"inner_product\"");
        let kind: DistanceKind = serde_json::from_str("\"cosine\"").unwrap();
        assert_eq!(kind, DistanceKind::Cosine);
        assert_eq!(kind.name(), "cosine");
    }
}
