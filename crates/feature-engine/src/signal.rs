//! Window batches and single-axis window views

use crate::{FeatureError, FeatureResult};

/// One axis of one window: `N` borrowed samples plus the sampling rate
#[derive(Debug, Clone, Copy)]
pub struct SignalWindow<'a> {
    samples: &'a [f64],
    sampling_rate: f64,
}

impl<'a> SignalWindow<'a> {
    /// Wrap a sample slice
    pub fn new(samples: &'a [f64], sampling_rate: f64) -> Self {
        Self {
            samples,
            sampling_rate,
        }
    }

    /// Samples of the window
    pub fn samples(&self) -> &'a [f64] {
        self.samples
    }

    /// Sampling rate (Hz)
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A batch of equal-length windows over one or more axes.
///
/// Each axis is a row-major `(window_count, samples_per_window)` buffer; all
/// axes share the window count and sampling rate.
#[derive(Debug, Clone)]
pub struct WindowBatch<'a> {
    axes: Vec<&'a [f64]>,
    samples_per_window: usize,
    window_count: usize,
    sampling_rate: f64,
}

impl<'a> WindowBatch<'a> {
    /// Validate and wrap the per-axis buffers
    pub fn new(
        axes: Vec<&'a [f64]>,
        samples_per_window: usize,
        sampling_rate: f64,
    ) -> FeatureResult<Self> {
        if axes.is_empty() {
            return Err(FeatureError::InvalidInput(
                "batch needs at least one axis".into(),
            ));
        }
        if samples_per_window < 2 {
            return Err(FeatureError::InvalidInput(format!(
                "windows need at least 2 samples, got {}",
                samples_per_window
            )));
        }
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(FeatureError::InvalidInput(format!(
                "sampling rate must be finite and positive, got {}",
                sampling_rate
            )));
        }

        let len = axes[0].len();
        if let Some((axis, other)) = axes.iter().enumerate().find(|(_, a)| a.len() != len) {
            return Err(FeatureError::InvalidInput(format!(
                "axis {} holds {} samples, axis 0 holds {}",
                axis,
                other.len(),
                len
            )));
        }
        if len % samples_per_window != 0 {
            return Err(FeatureError::InvalidInput(format!(
                "{} samples per axis is not a whole number of {}-sample windows",
                len, samples_per_window
            )));
        }

        Ok(Self {
            axes,
            samples_per_window,
            window_count: len / samples_per_window,
            sampling_rate,
        })
    }

    /// Single-axis batch
    pub fn single_axis(
        samples: &'a [f64],
        samples_per_window: usize,
        sampling_rate: f64,
    ) -> FeatureResult<Self> {
        Self::new(vec![samples], samples_per_window, sampling_rate)
    }

    /// Number of windows
    pub fn window_count(&self) -> usize {
        self.window_count
    }

    /// Number of axes
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Samples per window (`N`)
    pub fn samples_per_window(&self) -> usize {
        self.samples_per_window
    }

    /// Shared sampling rate (Hz)
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// View of `axis` in `window`; `None` when out of bounds
    pub fn window(&self, window: usize, axis: usize) -> Option<SignalWindow<'a>> {
        if window >= self.window_count {
            return None;
        }
        let start = window * self.samples_per_window;
        let samples = self.axes.get(axis)?.get(start..start + self.samples_per_window)?;
        Some(SignalWindow::new(samples, self.sampling_rate))
    }

    /// Window of a flat `(window, axis)` cell index, window-major
    pub(crate) fn cell(&self, cell: usize) -> Option<SignalWindow<'a>> {
        let axes = self.axes.len();
        self.window(cell / axes, cell % axes)
    }

    /// Total `(window, axis)` cells
    pub(crate) fn cell_count(&self) -> usize {
        self.window_count * self.axes.len()
    }
}
