//! Feature Engine
//!
//! Computes statistical, spectral, entropy and smoothness features over
//! batches of fixed-length multi-axis inertial windows. Requests are validated
//! up front, dispatched to `signal-kernels`, and assembled into a
//! `(window, axis, feature)` matrix.

mod config;
mod context;
mod dispatch;
mod engine;
mod error;
mod matrix;
pub mod registry;
pub mod request;
mod signal;

pub use crate::config::{EngineConfig, ENV_PREFIX};
pub use context::ComputeContext;
pub use engine::{compute_features, FeatureEngine};
pub use error::{FeatureError, FeatureResult};
pub use matrix::FeatureMatrix;
pub use registry::{FeatureFamily, FeatureInfo, FeatureKind, ENTRIES};
pub use request::FeatureRequest;
pub use signal::{SignalWindow, WindowBatch};

pub use signal_kernels::smoothness::SparcSettings;
pub use signal_kernels::spectral::SpectralRange;
pub use signal_kernels::Taper;
