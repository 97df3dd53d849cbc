//! Kernel Error Types

use thiserror::Error;

/// Contract violations detected inside a numeric kernel.
///
/// Degenerate signals (constant windows, zero spectra) are not errors; kernels
/// report those through documented sentinel values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Buffer is shorter than the kernel requires
    #[error("buffer of length {actual} is too short, need at least {required}")]
    TooShort { required: usize, actual: usize },

    /// Two buffers that must agree in length do not
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A numeric argument is outside its valid domain
    #[error("{name} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
