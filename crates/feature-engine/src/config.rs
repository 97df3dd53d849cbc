//! Engine configuration

use crate::request::{
    AutocorrelationParams, EmbeddingParams, SampleEntropyParams, SignalEntropyParams,
    SpectralEntropyParams,
};
use crate::{FeatureRequest, FeatureResult};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use signal_kernels::smoothness::SparcSettings;
use signal_kernels::spectral::SpectralRange;
use signal_kernels::Taper;
use std::path::Path;

/// Prefix of environment overrides, e.g. `IMU_FEATURES__TAPER=hamming`
pub const ENV_PREFIX: &str = "IMU_FEATURES";

/// Feature engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window applied before spectral transforms
    pub taper: Taper,

    /// Spread each feature column across the rayon pool.
    /// Only honoured when built with the `parallel` feature.
    pub parallel: bool,

    /// Feature bank computed by `FeatureEngine::compute_bank`
    pub features: Vec<FeatureRequest>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            taper: Taper::None,
            parallel: false,
            features: vec![
                FeatureRequest::Mean,
                FeatureRequest::StdDev,
                FeatureRequest::Skewness,
                FeatureRequest::Kurtosis,
                FeatureRequest::Range,
                FeatureRequest::Rms,
                FeatureRequest::DominantFrequency(SpectralRange::default()),
                FeatureRequest::SpectralEntropy(SpectralEntropyParams::default()),
            ],
        }
    }
}

impl EngineConfig {
    /// Walking-bout features: cadence band spectra, regularity and smoothness
    pub fn gait() -> Self {
        let cadence = SpectralRange {
            low_hz: 0.5,
            high_hz: Some(3.0),
            include_dc: false,
        };
        Self {
            taper: Taper::Hamming,
            features: vec![
                FeatureRequest::DominantFrequency(cadence),
                FeatureRequest::DominantFrequencyValue(cadence),
                FeatureRequest::band_power_ratio(0.5, 3.0),
                FeatureRequest::SpectralEntropy(SpectralEntropyParams {
                    low_hz: 0.5,
                    high_hz: Some(10.0),
                    ..SpectralEntropyParams::default()
                }),
                FeatureRequest::Autocorrelation(AutocorrelationParams::default()),
                FeatureRequest::Sparc(SparcSettings::default()),
                FeatureRequest::JerkMetric,
                FeatureRequest::StdDev,
            ],
            ..Default::default()
        }
    }

    /// Activity classification features: amplitude, spread and complexity
    pub fn activity() -> Self {
        Self {
            features: vec![
                FeatureRequest::Mean,
                FeatureRequest::StdDev,
                FeatureRequest::Iqr,
                FeatureRequest::Range,
                FeatureRequest::MeanCrossRate,
                FeatureRequest::SignalEntropy(SignalEntropyParams::default()),
                FeatureRequest::SampleEntropy(SampleEntropyParams::default()),
                FeatureRequest::PermutationEntropy(EmbeddingParams::default()),
                FeatureRequest::DominantFrequency(SpectralRange::default()),
                FeatureRequest::SpectralFlatness(SpectralRange::default()),
            ],
            ..Default::default()
        }
    }

    /// Load from an optional file layered under `IMU_FEATURES__*` variables.
    ///
    /// A missing file falls back to defaults; the format follows the file
    /// extension.
    pub fn load(path: impl AsRef<Path>) -> FeatureResult<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse embedded TOML
    pub fn from_toml_str(toml: &str) -> FeatureResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
