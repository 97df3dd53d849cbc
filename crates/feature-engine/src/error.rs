//! Feature Engine Error Types

use crate::FeatureKind;
use signal_kernels::KernelError;
use thiserror::Error;

/// Errors that abort a feature batch.
///
/// Every request is validated before any kernel runs, so an error means no
/// part of the batch was computed.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Request parameters outside their valid range
    #[error("Invalid configuration for {feature}: {reason}")]
    InvalidConfiguration { feature: FeatureKind, reason: String },

    /// Windows are shorter than the feature needs
    #[error("{feature} needs windows of at least {required} samples, got {actual}")]
    InsufficientWindowLength {
        feature: FeatureKind,
        required: usize,
        actual: usize,
    },

    /// Malformed window batch
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Kernel contract violation
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

/// Result alias for feature engine operations
pub type FeatureResult<T> = Result<T, FeatureError>;
