//! Feature Requests
//!
//! A request names one feature and carries its parameters. Requests are plain
//! data (serde, internally tagged by `feature`) so feature banks can live in
//! configuration files:
//!
//! ```toml
//! [[features]]
//! feature = "sample_entropy"
//! m = 2
//! r = 0.2
//! ```

use crate::{FeatureError, FeatureKind, FeatureResult};
use serde::{Deserialize, Serialize};
use signal_kernels::entropy::{MAX_PERMUTATION_ORDER, MAX_SVD_ORDER};
use signal_kernels::smoothness::SparcSettings;
use signal_kernels::spectral::SpectralRange;

pub use signal_kernels::entropy::BinRule;

/// Largest SPARC zero-padding exponent accepted in a request
pub const MAX_SPARC_PADLEVEL: u32 = 8;

/// Percentile rank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PercentileParams {
    /// Rank in `[0, 100]`
    pub p: f64,
}

impl Default for PercentileParams {
    fn default() -> Self {
        Self { p: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocorrelationParams {
    pub lag: usize,
    /// Pearson correlation instead of raw lagged covariance
    pub normalize: bool,
}

impl Default for AutocorrelationParams {
    fn default() -> Self {
        Self {
            lag: 1,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityParams {
    /// z-normalize before measuring
    pub normalize: bool,
}

impl Default for ComplexityParams {
    fn default() -> Self {
        Self { normalize: true }
    }
}

/// Half-open value interval `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeCountParams {
    pub min: f64,
    pub max: f64,
}

impl Default for RangeCountParams {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RSigmaParams {
    /// Distance from the mean in standard deviations
    pub r: f64,
}

impl Default for RSigmaParams {
    fn default() -> Self {
        Self { r: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalEntropyParams {
    pub bins: BinRule,
}

/// Sample entropy template length and tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleEntropyParams {
    /// Embedding dimension
    pub m: usize,
    /// Tolerance as a fraction of the window's standard deviation
    pub r: f64,
}

impl Default for SampleEntropyParams {
    fn default() -> Self {
        Self { m: 2, r: 0.2 }
    }
}

/// Delay embedding shared by permutation and SVD entropy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingParams {
    pub order: usize,
    pub delay: usize,
    pub normalize: bool,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            order: 3,
            delay: 1,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralEntropyParams {
    pub low_hz: f64,
    pub high_hz: Option<f64>,
    pub include_dc: bool,
    /// Divide by `ln(bins)`
    pub normalize: bool,
}

impl Default for SpectralEntropyParams {
    fn default() -> Self {
        Self {
            low_hz: 0.0,
            high_hz: None,
            include_dc: false,
            normalize: true,
        }
    }
}

impl SpectralEntropyParams {
    pub fn range(&self) -> SpectralRange {
        SpectralRange {
            low_hz: self.low_hz,
            high_hz: self.high_hz,
            include_dc: self.include_dc,
        }
    }
}

/// Band edges for a power ratio (Hz, inclusive after snapping)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandParams {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            low_hz: 0.5,
            high_hz: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionlessJerkParams {
    /// Report `-ln|D|` instead of `D`
    pub log: bool,
}

/// One feature with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum FeatureRequest {
    Mean,
    Variance,
    StdDev,
    Skewness,
    Kurtosis,
    Range,
    Iqr,
    Median,
    Percentile(PercentileParams),
    Rms,
    ZeroCrossings,
    MeanCrossings,
    MeanCrossRate,
    Autocorrelation(AutocorrelationParams),
    LinearSlope,
    ComplexityInvariantDistance(ComplexityParams),
    RangeCountPercentage(RangeCountParams),
    RatioBeyondRSigma(RSigmaParams),
    SignalEntropy(SignalEntropyParams),
    SampleEntropy(SampleEntropyParams),
    PermutationEntropy(EmbeddingParams),
    SvdEntropy(EmbeddingParams),
    DominantFrequency(SpectralRange),
    DominantFrequencyValue(SpectralRange),
    SpectralEntropy(SpectralEntropyParams),
    SpectralFlatness(SpectralRange),
    BandPowerRatio(BandParams),
    JerkMetric,
    DimensionlessJerk(DimensionlessJerkParams),
    Sparc(SparcSettings),
}

impl FeatureRequest {
    /// Percentile at rank `p`
    pub fn percentile(p: f64) -> Self {
        Self::Percentile(PercentileParams { p })
    }

    /// Sample entropy with embedding dimension `m` and tolerance `r`
    pub fn sample_entropy(m: usize, r: f64) -> Self {
        Self::SampleEntropy(SampleEntropyParams { m, r })
    }

    /// Dominant frequency between `low_hz` and `high_hz`, DC excluded
    pub fn dominant_frequency(low_hz: f64, high_hz: f64) -> Self {
        Self::DominantFrequency(SpectralRange {
            low_hz,
            high_hz: Some(high_hz),
            include_dc: false,
        })
    }

    /// Power in `[low_hz, high_hz]` over total power
    pub fn band_power_ratio(low_hz: f64, high_hz: f64) -> Self {
        Self::BandPowerRatio(BandParams { low_hz, high_hz })
    }

    /// Feature identifier of this request
    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Mean => FeatureKind::Mean,
            Self::Variance => FeatureKind::Variance,
            Self::StdDev => FeatureKind::StdDev,
            Self::Skewness => FeatureKind::Skewness,
            Self::Kurtosis => FeatureKind::Kurtosis,
            Self::Range => FeatureKind::Range,
            Self::Iqr => FeatureKind::Iqr,
            Self::Median => FeatureKind::Median,
            Self::Percentile(_) => FeatureKind::Percentile,
            Self::Rms => FeatureKind::Rms,
            Self::ZeroCrossings => FeatureKind::ZeroCrossings,
            Self::MeanCrossings => FeatureKind::MeanCrossings,
            Self::MeanCrossRate => FeatureKind::MeanCrossRate,
            Self::Autocorrelation(_) => FeatureKind::Autocorrelation,
            Self::LinearSlope => FeatureKind::LinearSlope,
            Self::ComplexityInvariantDistance(_) => FeatureKind::ComplexityInvariantDistance,
            Self::RangeCountPercentage(_) => FeatureKind::RangeCountPercentage,
            Self::RatioBeyondRSigma(_) => FeatureKind::RatioBeyondRSigma,
            Self::SignalEntropy(_) => FeatureKind::SignalEntropy,
            Self::SampleEntropy(_) => FeatureKind::SampleEntropy,
            Self::PermutationEntropy(_) => FeatureKind::PermutationEntropy,
            Self::SvdEntropy(_) => FeatureKind::SvdEntropy,
            Self::DominantFrequency(_) => FeatureKind::DominantFrequency,
            Self::DominantFrequencyValue(_) => FeatureKind::DominantFrequencyValue,
            Self::SpectralEntropy(_) => FeatureKind::SpectralEntropy,
            Self::SpectralFlatness(_) => FeatureKind::SpectralFlatness,
            Self::BandPowerRatio(_) => FeatureKind::BandPowerRatio,
            Self::JerkMetric => FeatureKind::JerkMetric,
            Self::DimensionlessJerk(_) => FeatureKind::DimensionlessJerk,
            Self::Sparc(_) => FeatureKind::Sparc,
        }
    }

    /// Shortest window the feature is defined on
    pub fn min_window_len(&self) -> usize {
        match self {
            Self::Mean
            | Self::Range
            | Self::Iqr
            | Self::Median
            | Self::Percentile(_)
            | Self::Rms
            | Self::RangeCountPercentage(_)
            | Self::RatioBeyondRSigma(_)
            | Self::SignalEntropy(_) => 1,
            Self::Autocorrelation(p) => p.lag.saturating_add(2),
            Self::SampleEntropy(p) => p.m.saturating_add(2),
            Self::PermutationEntropy(p) => embedding_span(p).saturating_add(1),
            Self::SvdEntropy(p) => embedding_span(p).saturating_add(p.order),
            _ => 2,
        }
    }

    /// Check parameters, then the window length `n` at `sampling_rate`.
    ///
    /// Parameter problems are reported as `InvalidConfiguration` before the
    /// length check runs.
    pub fn validate(&self, n: usize, sampling_rate: f64) -> FeatureResult<()> {
        let feature = self.kind();
        let invalid = |reason: String| FeatureError::InvalidConfiguration { feature, reason };
        let nyquist = sampling_rate / 2.0;

        match self {
            Self::Percentile(p) => {
                if !(0.0..=100.0).contains(&p.p) {
                    return Err(invalid(format!("p = {} is outside [0, 100]", p.p)));
                }
            }
            Self::Autocorrelation(p) => {
                if p.lag == 0 {
                    return Err(invalid("lag must be at least 1".into()));
                }
            }
            Self::RangeCountPercentage(p) => {
                if !p.min.is_finite() || !p.max.is_finite() || p.min >= p.max {
                    return Err(invalid(format!(
                        "interval [{}, {}) is empty or not finite",
                        p.min, p.max
                    )));
                }
            }
            Self::RatioBeyondRSigma(p) => {
                if !p.r.is_finite() || p.r < 0.0 {
                    return Err(invalid(format!("r = {} must be finite and >= 0", p.r)));
                }
            }
            Self::SignalEntropy(p) => {
                if let BinRule::Count(k) = p.bins {
                    if !(1..=n).contains(&k) {
                        return Err(invalid(format!("bin count {} is outside [1, {}]", k, n)));
                    }
                }
            }
            Self::SampleEntropy(p) => {
                if p.m == 0 {
                    return Err(invalid("embedding dimension m must be at least 1".into()));
                }
                if !p.r.is_finite() || p.r <= 0.0 {
                    return Err(invalid(format!("tolerance r = {} must be positive", p.r)));
                }
            }
            Self::PermutationEntropy(p) => {
                if !(2..=MAX_PERMUTATION_ORDER).contains(&p.order) {
                    return Err(invalid(format!(
                        "order {} is outside [2, {}]",
                        p.order, MAX_PERMUTATION_ORDER
                    )));
                }
                if p.delay == 0 {
                    return Err(invalid("delay must be at least 1".into()));
                }
            }
            Self::SvdEntropy(p) => {
                if !(2..=MAX_SVD_ORDER).contains(&p.order) {
                    return Err(invalid(format!(
                        "order {} is outside [2, {}]",
                        p.order, MAX_SVD_ORDER
                    )));
                }
                if p.delay == 0 {
                    return Err(invalid("delay must be at least 1".into()));
                }
            }
            Self::DominantFrequency(range)
            | Self::DominantFrequencyValue(range)
            | Self::SpectralFlatness(range) => check_range(range, nyquist).map_err(invalid)?,
            Self::SpectralEntropy(p) => check_range(&p.range(), nyquist).map_err(invalid)?,
            Self::BandPowerRatio(p) => {
                if !p.low_hz.is_finite() || !p.high_hz.is_finite() || p.low_hz < 0.0 {
                    return Err(invalid(format!(
                        "band [{}, {}] must be finite and non-negative",
                        p.low_hz, p.high_hz
                    )));
                }
                if p.low_hz > p.high_hz {
                    return Err(invalid(format!(
                        "band low edge {} is above high edge {}",
                        p.low_hz, p.high_hz
                    )));
                }
                if p.low_hz > nyquist {
                    return Err(invalid(format!(
                        "band low edge {} Hz is above Nyquist ({} Hz)",
                        p.low_hz, nyquist
                    )));
                }
            }
            Self::Sparc(s) => {
                if !s.fc_hz.is_finite() || s.fc_hz <= 0.0 {
                    return Err(invalid(format!("fc_hz = {} must be positive", s.fc_hz)));
                }
                if !(s.amp_threshold > 0.0 && s.amp_threshold <= 1.0) {
                    return Err(invalid(format!(
                        "amp_threshold = {} is outside (0, 1]",
                        s.amp_threshold
                    )));
                }
                if s.padlevel > MAX_SPARC_PADLEVEL {
                    return Err(invalid(format!(
                        "padlevel {} exceeds {}",
                        s.padlevel, MAX_SPARC_PADLEVEL
                    )));
                }
                if !s.tolerance.is_finite() || s.tolerance < 0.0 {
                    return Err(invalid(format!("tolerance = {} must be >= 0", s.tolerance)));
                }
                if s.max_iterations == 0 {
                    return Err(invalid("max_iterations must be at least 1".into()));
                }
            }
            _ => {}
        }

        let required = self.min_window_len();
        if n < required {
            return Err(FeatureError::InsufficientWindowLength {
                feature,
                required,
                actual: n,
            });
        }
        Ok(())
    }
}

fn embedding_span(p: &EmbeddingParams) -> usize {
    p.order.saturating_sub(1).saturating_mul(p.delay)
}

fn check_range(range: &SpectralRange, nyquist: f64) -> Result<(), String> {
    if !range.low_hz.is_finite() || range.low_hz < 0.0 {
        return Err(format!("low_hz = {} must be finite and >= 0", range.low_hz));
    }
    if range.low_hz > nyquist {
        return Err(format!(
            "low_hz = {} is above Nyquist ({} Hz)",
            range.low_hz, nyquist
        ));
    }
    if let Some(high) = range.high_hz {
        if !high.is_finite() || high < range.low_hz {
            return Err(format!(
                "high_hz = {} must be finite and >= low_hz ({})",
                high, range.low_hz
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_every_variant() {
        let requests = [
            FeatureRequest::Mean,
            FeatureRequest::percentile(90.0),
            FeatureRequest::sample_entropy(2, 0.2),
            FeatureRequest::dominant_frequency(0.5, 3.0),
            FeatureRequest::Sparc(SparcSettings::default()),
        ];
        let kinds: Vec<_> = requests.iter().map(FeatureRequest::kind).collect();
        assert_eq!(
            kinds,
            vec![
                FeatureKind::Mean,
                FeatureKind::Percentile,
                FeatureKind::SampleEntropy,
                FeatureKind::DominantFrequency,
                FeatureKind::Sparc,
            ]
        );
    }

    #[test]
    fn test_sample_entropy_window_length() {
        let request = FeatureRequest::sample_entropy(2, 0.2);
        assert_eq!(request.min_window_len(), 4);
        assert!(request.validate(4, 50.0).is_ok());
        // m + 1 >= N
        match request.validate(3, 50.0) {
            Err(FeatureError::InsufficientWindowLength {
                feature,
                required,
                actual,
            }) => {
                assert_eq!(feature, FeatureKind::SampleEntropy);
                assert_eq!(required, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parameters_checked_before_length() {
        let request = FeatureRequest::sample_entropy(0, 0.2);
        assert!(matches!(
            request.validate(1, 50.0),
            Err(FeatureError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = [
            FeatureRequest::percentile(101.0),
            FeatureRequest::percentile(f64::NAN),
            FeatureRequest::sample_entropy(2, 0.0),
            FeatureRequest::Autocorrelation(AutocorrelationParams {
                lag: 0,
                normalize: true,
            }),
            FeatureRequest::PermutationEntropy(EmbeddingParams {
                order: 9,
                ..EmbeddingParams::default()
            }),
            FeatureRequest::SvdEntropy(EmbeddingParams {
                delay: 0,
                ..EmbeddingParams::default()
            }),
            FeatureRequest::band_power_ratio(3.0, 1.0),
            FeatureRequest::dominant_frequency(40.0, 45.0),
            FeatureRequest::RangeCountPercentage(RangeCountParams { min: 1.0, max: 1.0 }),
            FeatureRequest::SignalEntropy(SignalEntropyParams {
                bins: BinRule::Count(0),
            }),
            FeatureRequest::Sparc(SparcSettings {
                amp_threshold: 0.0,
                ..SparcSettings::default()
            }),
        ];
        for request in bad {
            assert!(
                matches!(
                    request.validate(256, 50.0),
                    Err(FeatureError::InvalidConfiguration { .. })
                ),
                "{:?} accepted",
                request
            );
        }
    }

    #[test]
    fn test_bin_count_bounded_by_window() {
        let bins = |k| {
            FeatureRequest::SignalEntropy(SignalEntropyParams {
                bins: BinRule::Count(k),
            })
        };
        assert!(bins(32).validate(32, 10.0).is_ok());
        for k in [33, usize::MAX] {
            assert!(matches!(
                bins(k).validate(32, 10.0),
                Err(FeatureError::InvalidConfiguration {
                    feature: FeatureKind::SignalEntropy,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_svd_order_bounded() {
        let svd = |order| {
            FeatureRequest::SvdEntropy(EmbeddingParams {
                order,
                delay: 1,
                normalize: true,
            })
        };
        assert!(svd(MAX_SVD_ORDER).validate(1_000, 50.0).is_ok());
        // Long enough window, but the Gram matrix would be order²
        assert!(matches!(
            svd(100_000).validate(200_000, 50.0),
            Err(FeatureError::InvalidConfiguration {
                feature: FeatureKind::SvdEntropy,
                ..
            })
        ));
    }

    #[test]
    fn test_embedding_lengths() {
        let perm = FeatureRequest::PermutationEntropy(EmbeddingParams {
            order: 4,
            delay: 2,
            normalize: true,
        });
        assert_eq!(perm.min_window_len(), 7);
        let svd = FeatureRequest::SvdEntropy(EmbeddingParams {
            order: 4,
            delay: 2,
            normalize: true,
        });
        assert_eq!(svd.min_window_len(), 10);
    }
}
