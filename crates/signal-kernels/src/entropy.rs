//! Entropy and complexity estimators
//!
//! All entropies use the natural logarithm. Degenerate windows follow one
//! convention: a constant window is perfectly regular and scores 0.0, while a
//! ratio that has no defined value (no template matches in sample entropy)
//! scores `NaN`.

use crate::linalg::singular_values;
use crate::stats::{is_flat, peak, std_dev};
use serde::{Deserialize, Serialize};

/// Histogram bin width used by [`BinRule::Auto`], as a fraction of σ
pub const AUTO_BIN_WIDTH: f64 = 0.5;

/// Largest ordinal-pattern order; 8! patterns is the histogram size ceiling
pub const MAX_PERMUTATION_ORDER: usize = 8;

/// Largest SVD embedding dimension; the Gram matrix is `order²`
pub const MAX_SVD_ORDER: usize = 32;

/// Singular values below this fraction of the largest count as zero
const RANK_TOLERANCE: f64 = 1e-7;

/// How the signal-entropy histogram picks its bin count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinRule {
    /// Bin width of `AUTO_BIN_WIDTH * σ`, count clamped to `[1, n]`
    #[default]
    Auto,
    /// Fixed number of equal-width bins, clamped to `[1, n]`
    Count(usize),
}

/// Shannon entropy of `-Σ p ln p` over non-empty bins of a probability-like
/// histogram with `total` samples.
fn shannon<I: IntoIterator<Item = usize>>(counts: I, total: usize) -> f64 {
    let total = total as f64;
    counts
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Shannon entropy of the window's equal-width histogram over `[min, max]`.
///
/// Constant windows yield 0.0.
pub fn signal_entropy(values: &[f64], bins: BinRule) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }

    let sigma = std_dev(values, 0);
    if is_flat(sigma, peak(values), n) {
        return 0.0;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let count = match bins {
        BinRule::Count(k) => k.clamp(1, n),
        BinRule::Auto => ((span / (AUTO_BIN_WIDTH * sigma)).ceil() as usize).clamp(1, n),
    };

    let mut histogram = vec![0usize; count];
    for &v in values {
        let idx = ((v - min) / span * count as f64) as usize;
        histogram[idx.min(count - 1)] += 1;
    }
    shannon(histogram, n)
}

/// Sample entropy, `-ln(A / B)`.
///
/// `B` counts pairs of length-`m` templates within Chebyshev distance
/// `r * σ` (population σ), `A` the pairs that still match at length `m + 1`.
/// Both use the same `n - m` template starts; self-matches are excluded and
/// each unordered pair counts once.
///
/// O(n² · m) time, no allocation. Returns 0.0 for a constant window and `NaN`
/// when either count is zero. Requires `m >= 1` and `m + 2 <= n`.
pub fn sample_entropy(values: &[f64], m: usize, r: f64) -> f64 {
    let n = values.len();
    if m == 0 || m + 2 > n {
        return f64::NAN;
    }

    let sigma = std_dev(values, 0);
    if is_flat(sigma, peak(values), n) {
        return 0.0;
    }
    let tolerance = r * sigma;

    let templates = n - m;
    let mut matches_m: u64 = 0;
    let mut matches_m1: u64 = 0;
    for i in 0..templates {
        for j in i + 1..templates {
            let close = (0..m).all(|k| (values[i + k] - values[j + k]).abs() <= tolerance);
            if close {
                matches_m += 1;
                if (values[i + m] - values[j + m]).abs() <= tolerance {
                    matches_m1 += 1;
                }
            }
        }
    }

    if matches_m == 0 || matches_m1 == 0 {
        return f64::NAN;
    }
    -(matches_m1 as f64 / matches_m as f64).ln()
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// Lehmer code of a permutation of `0..perm.len()`, in `0..perm.len()!`
fn lehmer_code(perm: &[usize]) -> usize {
    let m = perm.len();
    let mut code = 0;
    for i in 0..m {
        let smaller = perm[i + 1..].iter().filter(|&&p| p < perm[i]).count();
        code = code * (m - i) + smaller;
    }
    code
}

/// Permutation entropy over ordinal patterns of `order` samples spaced by
/// `delay`.
///
/// Ties rank by position, so a constant window has a single pattern and
/// scores 0.0. With `normalize` the result is divided by `ln(order!)`.
/// Requires `2 <= order <= MAX_PERMUTATION_ORDER` and at least one pattern.
pub fn permutation_entropy(values: &[f64], order: usize, delay: usize, normalize: bool) -> f64 {
    let span = (order.saturating_sub(1)) * delay;
    if !(2..=MAX_PERMUTATION_ORDER).contains(&order) || delay == 0 || span >= values.len() {
        return f64::NAN;
    }

    let patterns = values.len() - span;
    let mut histogram = vec![0usize; factorial(order)];
    let mut perm: Vec<usize> = (0..order).collect();

    for start in 0..patterns {
        let sample = |k: usize| values[start + k * delay];
        for (k, slot) in perm.iter_mut().enumerate() {
            *slot = k;
        }
        perm.sort_unstable_by(|&a, &b| sample(a).total_cmp(&sample(b)).then(a.cmp(&b)));
        histogram[lehmer_code(&perm)] += 1;
    }

    let entropy = shannon(histogram, patterns);
    if normalize {
        entropy / (factorial(order) as f64).ln()
    } else {
        entropy
    }
}

/// SVD entropy of the delay embedding with `order` columns spaced by `delay`.
///
/// Singular values are normalized to a distribution; values below a relative
/// rank tolerance are dropped so a constant window (rank one) scores exactly
/// 0.0, as does an all-zero window. With `normalize` the result is divided by
/// `ln(order)`. Requires `2 <= order <= MAX_SVD_ORDER`.
pub fn svd_entropy(values: &[f64], order: usize, delay: usize, normalize: bool) -> f64 {
    let span = (order.saturating_sub(1)).saturating_mul(delay);
    if !(2..=MAX_SVD_ORDER).contains(&order) || delay == 0 || span >= values.len() {
        return f64::NAN;
    }

    let rows = values.len() - span;
    let mut embedding = Vec::with_capacity(rows * order);
    for i in 0..rows {
        embedding.extend((0..order).map(|k| values[i + k * delay]));
    }

    let singular = match singular_values(&embedding, rows, order) {
        Ok(sv) => sv,
        Err(_) => return f64::NAN,
    };
    let largest = singular.first().copied().unwrap_or(0.0);
    if largest <= 0.0 {
        return 0.0;
    }

    let kept: Vec<f64> = singular
        .into_iter()
        .filter(|&s| s > RANK_TOLERANCE * largest)
        .collect();
    let total: f64 = kept.iter().sum();
    let entropy: f64 = kept
        .iter()
        .map(|&s| {
            let p = s / total;
            -p * p.ln()
        })
        .sum();

    if normalize {
        entropy / (order as f64).ln()
    } else {
        entropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn sine(n: usize, period: f64) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * i as f64 / period).sin()).collect()
    }

    /// Seeded uniform noise in [-1, 1)
    fn noise(n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn test_signal_entropy_uniform_bins() {
        let values: Vec<f64> = (0..8).map(f64::from).collect();
        // 4 bins, 2 samples each
        let h = signal_entropy(&values, BinRule::Count(4));
        assert!((h - 4.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_signal_entropy_bin_count_clamped_to_window() {
        let values: Vec<f64> = (0..8).map(f64::from).collect();
        // Every sample in its own bin either way
        let h = signal_entropy(&values, BinRule::Count(usize::MAX));
        assert!((h - 8.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_signal_entropy_constant() {
        assert_eq!(signal_entropy(&[2.5; 20], BinRule::Auto), 0.0);
        assert_eq!(signal_entropy(&[0.0; 20], BinRule::Count(10)), 0.0);
    }

    #[test]
    fn test_signal_entropy_small_spread_on_large_offset() {
        let values: Vec<f64> = (0..64)
            .map(|i| 1e6 + if i % 8 == 0 { 4e-7 } else { 0.0 })
            .collect();
        // One bin holds 1/8 of the samples, the other 7/8
        let expected = -(0.125f64 * 0.125f64.ln() + 0.875 * 0.875f64.ln());
        assert!((signal_entropy(&values, BinRule::Count(2)) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_signal_entropy_auto_bins_bounded() {
        let values = noise(200);
        let h = signal_entropy(&values, BinRule::Auto);
        assert!(h > 0.0);
        assert!(h <= (200.0f64).ln());
    }

    #[test]
    fn test_sample_entropy_sine_below_noise() {
        let regular = sample_entropy(&sine(300, 25.0), 2, 0.2);
        let irregular = sample_entropy(&noise(300), 2, 0.2);
        assert!(regular.is_finite());
        assert!(irregular.is_finite());
        assert!(regular < irregular, "{regular} !< {irregular}");
    }

    #[test]
    fn test_sample_entropy_constant_is_zero() {
        assert_eq!(sample_entropy(&[1.0; 50], 2, 0.2), 0.0);
    }

    #[test]
    fn test_sample_entropy_undefined() {
        // Strictly increasing with a tiny tolerance: no template pairs match
        let ramp: Vec<f64> = (0..20).map(|i| (i * i) as f64).collect();
        assert!(sample_entropy(&ramp, 2, 1e-6).is_nan());
        // Window too short for m
        assert!(sample_entropy(&[1.0, 2.0, 3.0], 2, 0.2).is_nan());
    }

    #[test]
    fn test_lehmer_code_is_bijective() {
        let mut seen = vec![false; 24];
        let mut perm = [0, 1, 2, 3];
        // Heap's algorithm over all 24 permutations
        let mut c = [0usize; 4];
        seen[lehmer_code(&perm)] = true;
        let mut i = 0;
        while i < 4 {
            if c[i] < i {
                if i % 2 == 0 {
                    perm.swap(0, i);
                } else {
                    perm.swap(c[i], i);
                }
                seen[lehmer_code(&perm)] = true;
                c[i] += 1;
                i = 0;
            } else {
                c[i] = 0;
                i += 1;
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(lehmer_code(&[0, 1, 2, 3]), 0);
        assert_eq!(lehmer_code(&[3, 2, 1, 0]), 23);
    }

    #[test]
    fn test_permutation_entropy_monotonic_is_zero() {
        let ramp: Vec<f64> = (0..100).map(f64::from).collect();
        assert_eq!(permutation_entropy(&ramp, 3, 1, true), 0.0);
        assert_eq!(permutation_entropy(&[4.0; 30], 4, 2, true), 0.0);
    }

    #[test]
    fn test_permutation_entropy_noise_near_one() {
        let h = permutation_entropy(&noise(5000), 3, 1, true);
        assert!(h > 0.95 && h <= 1.0, "{h}");
    }

    #[test]
    fn test_permutation_entropy_invalid_order() {
        assert!(permutation_entropy(&noise(50), 1, 1, true).is_nan());
        assert!(permutation_entropy(&noise(50), 9, 1, true).is_nan());
        assert!(permutation_entropy(&noise(4), 3, 2, true).is_nan());
    }

    #[test]
    fn test_svd_entropy_degenerate() {
        assert_eq!(svd_entropy(&[0.0; 40], 3, 1, true), 0.0);
        assert_eq!(svd_entropy(&[3.0; 40], 3, 1, true), 0.0);
    }

    #[test]
    fn test_svd_entropy_order_bounds() {
        let values = noise(200);
        assert!(svd_entropy(&values, 1, 1, true).is_nan());
        assert!(svd_entropy(&values, MAX_SVD_ORDER + 1, 1, true).is_nan());
        assert!(svd_entropy(&values, MAX_SVD_ORDER, 1, true).is_finite());
    }

    #[test]
    fn test_svd_entropy_ordering() {
        // A sinusoid spans a 2-D subspace of the embedding; noise spans all of it
        let regular = svd_entropy(&sine(400, 20.0), 5, 1, true);
        let irregular = svd_entropy(&noise(400), 5, 1, true);
        assert!(regular > 0.0);
        assert!(regular < irregular);
        assert!(irregular <= 1.0 + 1e-12);
    }
}
