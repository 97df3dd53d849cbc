//! Feature identifiers and their metadata table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every feature the engine can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Mean,
    Variance,
    StdDev,
    Skewness,
    Kurtosis,
    Range,
    Iqr,
    Median,
    Percentile,
    Rms,
    ZeroCrossings,
    MeanCrossings,
    MeanCrossRate,
    Autocorrelation,
    LinearSlope,
    ComplexityInvariantDistance,
    RangeCountPercentage,
    RatioBeyondRSigma,
    SignalEntropy,
    SampleEntropy,
    PermutationEntropy,
    SvdEntropy,
    DominantFrequency,
    DominantFrequencyValue,
    SpectralEntropy,
    SpectralFlatness,
    BandPowerRatio,
    JerkMetric,
    DimensionlessJerk,
    Sparc,
}

/// Feature grouping by kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    /// Moments and amplitude statistics
    Moment,
    /// Percentile-based statistics
    OrderStatistic,
    /// Crossings, correlation and trend over time
    Temporal,
    /// Entropy and complexity estimators
    Entropy,
    /// Power-spectrum features
    Spectral,
    /// Movement smoothness metrics
    Smoothness,
}

/// Static metadata for one feature
#[derive(Debug, Clone, Copy)]
pub struct FeatureInfo {
    pub kind: FeatureKind,
    /// Stable identifier, matches the serde name
    pub name: &'static str,
    pub family: FeatureFamily,
    /// Whether computing it builds or reuses an FFT plan
    pub uses_fft: bool,
}

const fn entry(
    kind: FeatureKind,
    name: &'static str,
    family: FeatureFamily,
    uses_fft: bool,
) -> FeatureInfo {
    FeatureInfo {
        kind,
        name,
        family,
        uses_fft,
    }
}

use FeatureFamily::*;

/// Metadata indexed by `FeatureKind as usize`
pub static ENTRIES: [FeatureInfo; FeatureKind::ALL.len()] = [
    entry(FeatureKind::Mean, "mean", Moment, false),
    entry(FeatureKind::Variance, "variance", Moment, false),
    entry(FeatureKind::StdDev, "std_dev", Moment, false),
    entry(FeatureKind::Skewness, "skewness", Moment, false),
    entry(FeatureKind::Kurtosis, "kurtosis", Moment, false),
    entry(FeatureKind::Range, "range", Moment, false),
    entry(FeatureKind::Iqr, "iqr", OrderStatistic, false),
    entry(FeatureKind::Median, "median", OrderStatistic, false),
    entry(FeatureKind::Percentile, "percentile", OrderStatistic, false),
    entry(FeatureKind::Rms, "rms", Moment, false),
    entry(FeatureKind::ZeroCrossings, "zero_crossings", Temporal, false),
    entry(FeatureKind::MeanCrossings, "mean_crossings", Temporal, false),
    entry(FeatureKind::MeanCrossRate, "mean_cross_rate", Temporal, false),
    entry(FeatureKind::Autocorrelation, "autocorrelation", Temporal, false),
    entry(FeatureKind::LinearSlope, "linear_slope", Temporal, false),
    entry(
        FeatureKind::ComplexityInvariantDistance,
        "complexity_invariant_distance",
        Temporal,
        false,
    ),
    entry(
        FeatureKind::RangeCountPercentage,
        "range_count_percentage",
        Moment,
        false,
    ),
    entry(FeatureKind::RatioBeyondRSigma, "ratio_beyond_r_sigma", Moment, false),
    entry(FeatureKind::SignalEntropy, "signal_entropy", Entropy, false),
    entry(FeatureKind::SampleEntropy, "sample_entropy", Entropy, false),
    entry(FeatureKind::PermutationEntropy, "permutation_entropy", Entropy, false),
    entry(FeatureKind::SvdEntropy, "svd_entropy", Entropy, false),
    entry(FeatureKind::DominantFrequency, "dominant_frequency", Spectral, true),
    entry(
        FeatureKind::DominantFrequencyValue,
        "dominant_frequency_value",
        Spectral,
        true,
    ),
    entry(FeatureKind::SpectralEntropy, "spectral_entropy", Spectral, true),
    entry(FeatureKind::SpectralFlatness, "spectral_flatness", Spectral, true),
    entry(FeatureKind::BandPowerRatio, "band_power_ratio", Spectral, true),
    entry(FeatureKind::JerkMetric, "jerk_metric", Smoothness, false),
    entry(FeatureKind::DimensionlessJerk, "dimensionless_jerk", Smoothness, false),
    entry(FeatureKind::Sparc, "sparc", Smoothness, true),
];

impl FeatureKind {
    /// All kinds in declaration order
    pub const ALL: [FeatureKind; 30] = [
        FeatureKind::Mean,
        FeatureKind::Variance,
        FeatureKind::StdDev,
        FeatureKind::Skewness,
        FeatureKind::Kurtosis,
        FeatureKind::Range,
        FeatureKind::Iqr,
        FeatureKind::Median,
        FeatureKind::Percentile,
        FeatureKind::Rms,
        FeatureKind::ZeroCrossings,
        FeatureKind::MeanCrossings,
        FeatureKind::MeanCrossRate,
        FeatureKind::Autocorrelation,
        FeatureKind::LinearSlope,
        FeatureKind::ComplexityInvariantDistance,
        FeatureKind::RangeCountPercentage,
        FeatureKind::RatioBeyondRSigma,
        FeatureKind::SignalEntropy,
        FeatureKind::SampleEntropy,
        FeatureKind::PermutationEntropy,
        FeatureKind::SvdEntropy,
        FeatureKind::DominantFrequency,
        FeatureKind::DominantFrequencyValue,
        FeatureKind::SpectralEntropy,
        FeatureKind::SpectralFlatness,
        FeatureKind::BandPowerRatio,
        FeatureKind::JerkMetric,
        FeatureKind::DimensionlessJerk,
        FeatureKind::Sparc,
    ];

    /// Registry entry for this kind
    pub fn info(self) -> &'static FeatureInfo {
        &ENTRIES[self as usize]
    }

    /// Stable identifier
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Kernel family
    pub fn family(self) -> FeatureFamily {
        self.info().family
    }

    /// Whether the feature goes through the FFT
    pub fn uses_fft(self) -> bool {
        self.info().uses_fft
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown feature name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureKind {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ENTRIES
            .iter()
            .find(|e| e.name == s)
            .map(|e| e.kind)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}
