//! Statistical Features Computation

use serde::{Deserialize, Serialize};

/// Fraction of total spectral power below which a bin counts as empty
pub const FLAT_TOLERANCE: f64 = 1e-12;

/// Whether a window of `len` samples with this spread and peak magnitude is
/// constant.
///
/// Summing `len` copies of `x` leaves a mean error of at most
/// `len * ε * |x|`, so any spread at or under that bound is rounding.
#[inline]
pub fn is_flat(std_dev: f64, peak: f64, len: usize) -> bool {
    std_dev <= len as f64 * f64::EPSILON * peak
}

/// Statistical features for a window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population variance (ddof = 0)
    pub variance: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Skewness (biased, 0.0 for constant windows)
    pub skewness: f64,
    /// Excess kurtosis (biased, 0.0 for constant windows)
    pub kurtosis: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Root mean square
    pub rms: f64,
    /// Number of mean crossings
    pub mean_crossings: usize,
}

impl StatisticalFeatures {
    /// Compute statistical features from a slice of values.
    ///
    /// Two passes: a refined mean first, then central moments around it.
    /// Constant windows report exactly zero variance and the 0.0 sentinel for
    /// skewness and kurtosis.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = mean(values);

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let peak = min.abs().max(max.abs());

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        let mut sum_sq = 0.0;
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
            sum_sq += v * v;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let rms = (sum_sq / n).sqrt();
        let mean_crossings = crossings(values, mean);

        let std_dev = m2.sqrt();
        if is_flat(std_dev, peak, values.len()) {
            return Self {
                mean,
                variance: 0.0,
                std_dev: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
                min,
                max,
                rms,
                mean_crossings,
            };
        }

        Self {
            mean,
            variance: m2,
            std_dev,
            // E[(X-μ)³] / σ³
            skewness: m3 / (m2 * std_dev),
            // E[(X-μ)⁴] / σ⁴ - 3
            kurtosis: m4 / (m2 * m2) - 3.0,
            min,
            max,
            rms,
            mean_crossings,
        }
    }
}

/// Arithmetic mean with one correction pass against summation error.
///
/// `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let rough = values.iter().sum::<f64>() / n;
    let correction = values.iter().map(|&v| v - rough).sum::<f64>() / n;
    rough + correction
}

/// Variance with `ddof` delta degrees of freedom (0 = population)
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|&v| (v - m) * (v - m)).sum();
    ss / (values.len() as f64 - ddof as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

/// Difference between the largest and smallest value
pub fn range(values: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

/// Root mean square, `sqrt(mean(x²))`
pub fn rms(values: &[f64]) -> f64 {
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Largest absolute value
pub fn peak(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// Count sign changes of `x - level` between consecutive samples.
///
/// Samples exactly at `level` carry no sign; the comparison continues from the
/// last signed sample, so `[-1, 0, 1]` is one crossing.
pub fn crossings(values: &[f64], level: f64) -> usize {
    let mut count = 0;
    let mut previous: Option<bool> = None;
    for &v in values {
        let d = v - level;
        if d == 0.0 {
            continue;
        }
        let positive = d > 0.0;
        if previous.is_some_and(|p| p != positive) {
            count += 1;
        }
        previous = Some(positive);
    }
    count
}

/// Number of zero crossings
pub fn zero_crossings(values: &[f64]) -> usize {
    crossings(values, 0.0)
}

/// Number of crossings of the window mean
pub fn mean_crossings(values: &[f64]) -> usize {
    crossings(values, mean(values))
}

/// Mean crossings per consecutive sample pair, `crossings / (n - 1)`
pub fn mean_cross_rate(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    mean_crossings(values) as f64 / (values.len() - 1) as f64
}

/// Lagged autocorrelation.
///
/// With `normalize` the lagged covariance of `x[..n-lag]` and `x[lag..]` is
/// divided by `(n - lag)` and both segments' sample standard deviations; a
/// segment with zero spread yields `NaN`. Without it the mean-removed lagged
/// covariance is returned. Requires `lag + 2 <= n`.
pub fn autocorrelation(values: &[f64], lag: usize, normalize: bool) -> f64 {
    let n = values.len();
    if lag + 2 > n {
        return f64::NAN;
    }
    let head = &values[..n - lag];
    let tail = &values[lag..];
    let head_mean = mean(head);
    let tail_mean = mean(tail);

    let cov: f64 = head
        .iter()
        .zip(tail)
        .map(|(&a, &b)| (a - head_mean) * (b - tail_mean))
        .sum::<f64>()
        / (n - lag) as f64;

    if !normalize {
        return cov;
    }

    let head_std = std_dev(head, 1);
    let tail_std = std_dev(tail, 1);
    if is_flat(head_std, peak(head), head.len()) || is_flat(tail_std, peak(tail), tail.len()) {
        return f64::NAN;
    }
    cov / (head_std * tail_std)
}

/// Least-squares slope of the samples against time `i / sampling_rate`
pub fn linear_slope(values: &[f64], sampling_rate: f64) -> f64 {
    let n = values.len() as f64;
    let t_mean = (n - 1.0) / (2.0 * sampling_rate);
    let x_mean = mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &x) in values.iter().enumerate() {
        let dt = i as f64 / sampling_rate - t_mean;
        sxy += dt * (x - x_mean);
        sxx += dt * dt;
    }
    if sxx == 0.0 {
        return f64::NAN;
    }
    sxy / sxx
}

/// Complexity invariant distance, `sqrt(Σ Δx²)`.
///
/// With `normalize` the signal is z-scored first (population σ); a constant
/// window has no complexity and yields 0.0.
pub fn complexity_invariant_distance(values: &[f64], normalize: bool) -> f64 {
    let ss: f64 = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    let distance = ss.sqrt();
    if !normalize {
        return distance;
    }

    let sigma = std_dev(values, 0);
    if is_flat(sigma, peak(values), values.len()) {
        return 0.0;
    }
    distance / sigma
}

/// Fraction of samples within `[min, max)`
pub fn range_count_percentage(values: &[f64], min: f64, max: f64) -> f64 {
    let count = values.iter().filter(|&&v| v >= min && v < max).count();
    count as f64 / values.len() as f64
}

/// Fraction of samples further than `r` population standard deviations from the mean
pub fn ratio_beyond_r_sigma(values: &[f64], r: f64) -> f64 {
    let m = mean(values);
    let threshold = r * std_dev(values, 0);
    let count = values.iter().filter(|&&v| (v - m).abs() > threshold).count();
    count as f64 / values.len() as f64
}
