//! Signal Kernels
//!
//! Numeric building blocks for windowed inertial-signal features: a mixed-radix
//! real FFT, in-place order statistics, two-pass moments, entropy estimators and
//! smoothness metrics. Every kernel borrows a `&[f64]` window and returns a
//! scalar; nothing here performs I/O or keeps global state.

mod error;

pub mod entropy;
pub mod fft;
pub mod linalg;
pub mod order;
pub mod smoothness;
pub mod spectral;
pub mod stats;

pub use error::KernelError;
pub use fft::{FftPlan, FftPlanner};
pub use spectral::{PowerSpectrum, Taper};
pub use stats::StatisticalFeatures;

/// Result alias for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;
