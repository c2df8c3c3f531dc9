//! Euclidean distance with an AVX2 fast path

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Compute Euclidean distance between two vectors
///
/// # Panics
/// Panics if vectors have different dimensions
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Compute squared Euclidean distance (no sqrt, order-preserving)
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= 8 && super::has_avx2() {
            return unsafe { euclidean_distance_squared_avx2(a, b) };
        }
    }

    euclidean_distance_squared_scalar(a, b)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn euclidean_distance_squared_avx2(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 8;

    let mut acc = _mm256_setzero_ps();
    for i in 0..chunks {
        let offset = i * 8;
        let va = _mm256_loadu_ps(a.as_ptr().add(offset));
        let vb = _mm256_loadu_ps(b.as_ptr().add(offset));
        let diff = _mm256_sub_ps(va, vb);
        acc = _mm256_add_ps(acc, _mm256_mul_ps(diff, diff));
    }

    let mut sum = super::horizontal_sum_avx2(acc);
    for i in chunks * 8..n {
        let diff = a[i] - b[i];
        sum += diff * diff;
    }
    sum
}

fn euclidean_distance_squared_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_euclidean_distance_same_vector() {
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(euclidean_distance_squared(&a, &a), 0.0);
    }

    #[test]
    #[should_panic(expected = "Vector dimensions must match")]
    fn test_euclidean_distance_dimension_mismatch() {
        euclidean_distance(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_simd_path_matches_scalar() {
        // 21 lanes: two full AVX chunks plus a tail
        let a: Vec<f32> = (0..21).map(|i| (i as f32).sin()).collect();
        let b: Vec<f32> = (0..21).map(|i| (i as f32).cos()).collect();

        let fast = euclidean_distance_squared(&a, &b);
        let slow = euclidean_distance_squared_scalar(&a, &b);
        assert!((fast - slow).abs() < 1e-4, "fast={} slow={}", fast, slow);
    }
}
