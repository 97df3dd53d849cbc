//! Feature Matrix Assembly

use crate::FeatureKind;
use serde::{Deserialize, Serialize};

/// Feature values shaped `(window_count, axis_count, feature_count)`.
///
/// Row-major: the features of one `(window, axis)` cell are contiguous, in
/// request order. `NaN` marks a feature that is undefined for its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    window_count: usize,
    axis_count: usize,
    kinds: Vec<FeatureKind>,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Zero-filled matrix for the given shape and feature order
    pub fn new(window_count: usize, axis_count: usize, kinds: Vec<FeatureKind>) -> Self {
        let len = window_count * axis_count * kinds.len();
        Self {
            window_count,
            axis_count,
            kinds,
            values: vec![0.0; len],
        }
    }

    /// `(window_count, axis_count, feature_count)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.window_count, self.axis_count, self.kinds.len())
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn feature_count(&self) -> usize {
        self.kinds.len()
    }

    /// Feature kinds in column order
    pub fn kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    fn offset(&self, window: usize, axis: usize, feature: usize) -> Option<usize> {
        if window >= self.window_count || axis >= self.axis_count || feature >= self.kinds.len() {
            return None;
        }
        Some((window * self.axis_count + axis) * self.kinds.len() + feature)
    }

    /// Value of one cell; `None` when out of bounds
    pub fn get(&self, window: usize, axis: usize, feature: usize) -> Option<f64> {
        self.offset(window, axis, feature).map(|i| self.values[i])
    }

    pub(crate) fn set(&mut self, window: usize, axis: usize, feature: usize, value: f64) {
        if let Some(i) = self.offset(window, axis, feature) {
            self.values[i] = value;
        }
    }

    /// All features of one `(window, axis)` cell
    pub fn row(&self, window: usize, axis: usize) -> Option<&[f64]> {
        if window >= self.window_count || axis >= self.axis_count {
            return None;
        }
        let width = self.kinds.len();
        let start = (window * self.axis_count + axis) * width;
        Some(&self.values[start..start + width])
    }

    /// One feature across every `(window, axis)` cell, window-major
    pub fn column(&self, feature: usize) -> impl Iterator<Item = f64> + '_ {
        let stride = self.kinds.len().max(1);
        let cells = if feature < self.kinds.len() {
            self.window_count * self.axis_count
        } else {
            0
        };
        (0..cells).map(move |cell| self.values[cell * stride + feature])
    }

    /// Number of undefined (`NaN`) cells
    pub fn undefined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Flat row-major values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Flat row-major values, consuming the matrix
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}
