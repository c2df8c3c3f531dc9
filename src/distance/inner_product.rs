//! Dot product and inner-product distance

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Dot product of two vectors
///
/// # Panics
/// Panics if vectors have different dimensions
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= 8 && super::has_avx2() {
            return unsafe { dot_product_avx2(a, b) };
        }
    }

    dot_product_scalar(a, b)
}

/// `1 - a·b`; only a true distance for unit-normalized inputs
#[inline]
pub fn inner_product_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot_product(a, b)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dot_product_avx2(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let chunks = n / 8;

    let mut acc = _mm256_setzero_ps();
    for i in 0..chunks {
        let offset = i * 8;
        let va = _mm256_loadu_ps(a.as_ptr().add(offset));
        let vb = _mm256_loadu_ps(b.as_ptr().add(offset));
        acc = _mm256_add_ps(acc, _mm256_mul_ps(va, vb));
    }

    let mut sum = super::horizontal_sum_avx2(acc);
    for i in chunks * 8..n {
        sum += a[i] * b[i];
    }
    sum
}

fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
