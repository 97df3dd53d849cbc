//! Movement smoothness metrics
//!
//! Derivative-based (jerk) and frequency-based (spectral arc length) measures.
//! SPARC is the only kernel with an iterative loop; see [`sparc`] for its
//! termination rule.

use crate::fft::FftPlanner;
use crate::stats::{peak, rms};
use crate::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};

/// Largest zero-padded FFT SPARC will request, as a power of two
pub const MAX_SPARC_FFT_EXPONENT: u32 = 22;

/// RMS of the first difference over RMS of the signal.
///
/// `NaN` when the signal RMS is zero.
pub fn jerk_metric(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let signal_rms = rms(values);
    if signal_rms == 0.0 {
        return f64::NAN;
    }

    let ss: f64 = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt() / signal_rms
}

/// Dimensionless jerk of an acceleration window.
///
/// `-(∫ jerk² dt) · T / peak²` with `jerk = Δx · fs`, `T = (n - 1) / fs` and
/// `peak = max|x|`. With `log` the value is `-ln|D|`. `NaN` for an all-zero
/// window.
pub fn dimensionless_jerk(values: &[f64], sampling_rate: f64, log: bool) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let amplitude = peak(values);
    if amplitude == 0.0 {
        return f64::NAN;
    }

    let dt = 1.0 / sampling_rate;
    let duration = (values.len() - 1) as f64 * dt;
    let integral: f64 = values
        .windows(2)
        .map(|w| ((w[1] - w[0]) * sampling_rate).powi(2) * dt)
        .sum();

    let dimensionless = -integral * duration / (amplitude * amplitude);
    if log {
        -dimensionless.abs().ln()
    } else {
        dimensionless
    }
}

/// Settings for the spectral arc length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparcSettings {
    /// Highest frequency considered by the cutoff search (Hz)
    pub fc_hz: f64,
    /// Normalized magnitude a bin needs to bound the arc
    pub amp_threshold: f64,
    /// Zero-padding exponent of the first pass: `2^(ceil(log2 n) + padlevel)`
    pub padlevel: u32,
    /// Relative change in arc length that ends refinement
    pub tolerance: f64,
    /// Upper bound on refinement passes
    pub max_iterations: usize,
}

impl Default for SparcSettings {
    fn default() -> Self {
        Self {
            fc_hz: 10.0,
            amp_threshold: 0.05,
            padlevel: 4,
            tolerance: 1e-3,
            max_iterations: 4,
        }
    }
}

/// FFT exponent of refinement `pass`, or `None` once padding passes the cap.
///
/// The cap never drops below the window's own power of two, so a long window
/// is transformed whole rather than truncated.
fn pass_exponent(len: usize, padlevel: u32, pass: u32) -> Option<u32> {
    let base = len.next_power_of_two().trailing_zeros();
    let ceiling = base.max(MAX_SPARC_FFT_EXPONENT);
    let exponent = base.saturating_add(padlevel).saturating_add(pass);
    if exponent > ceiling && pass > 0 {
        None
    } else {
        Some(exponent.min(ceiling))
    }
}

/// Spectral arc length at one zero-padding level; `None` when undefined
fn arc_length(
    values: &[f64],
    sampling_rate: f64,
    nfft: usize,
    settings: &SparcSettings,
    planner: &mut FftPlanner,
) -> KernelResult<Option<f64>> {
    if values.len() > nfft {
        return Err(KernelError::TooShort {
            required: values.len(),
            actual: nfft,
        });
    }
    let plan = planner.plan(nfft)?;
    let mut padded = values.to_vec();
    padded.resize(nfft, 0.0);
    let magnitude = plan.magnitude(&padded)?;

    let max = magnitude.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return Ok(None);
    }

    // Cutoff search: bins up to fc, trimmed to the run above the amplitude threshold
    let resolution = sampling_rate / nfft as f64;
    let last_bin = ((settings.fc_hz / resolution).floor() as usize).min(magnitude.len() - 1);
    let selected = &magnitude[..=last_bin];
    let above = |m: &f64| m / max >= settings.amp_threshold;
    let (first, last) = match (selected.iter().position(above), selected.iter().rposition(above)) {
        (Some(first), Some(last)) if last > first => (first, last),
        _ => return Ok(None),
    };

    let df = 1.0 / (last - first) as f64;
    let arc: f64 = selected[first..=last]
        .windows(2)
        .map(|w| {
            let dm = (w[1] - w[0]) / max;
            (df * df + dm * dm).sqrt()
        })
        .sum();
    Ok(Some(-arc))
}

/// Spectral arc length (SPARC) smoothness.
///
/// The magnitude spectrum of the zero-padded window is normalized to its
/// maximum; the cutoff search keeps the contiguous run of bins between the
/// first and last bin at or above `amp_threshold` below `fc_hz`, and the
/// negated arc length of that curve (frequency axis scaled to unit length) is
/// the result.
///
/// Termination: each pass raises the padding exponent by one. The loop stops
/// when the arc length changes by at most `tolerance` relative to the previous
/// pass, after `max_iterations` passes, or when the FFT length would exceed
/// `2^MAX_SPARC_FFT_EXPONENT` (or the window's own power of two, if larger);
/// the latest arc length is returned. `NaN` when
/// the spectrum is zero or the run spans fewer than two bins.
pub fn sparc(
    values: &[f64],
    sampling_rate: f64,
    settings: &SparcSettings,
    planner: &mut FftPlanner,
) -> KernelResult<f64> {
    if values.len() < 2 {
        return Ok(f64::NAN);
    }

    let mut previous: Option<f64> = None;
    for pass in 0..settings.max_iterations.max(1) as u32 {
        let nfft = match pass_exponent(values.len(), settings.padlevel, pass) {
            Some(exponent) => 1usize << exponent,
            None => break,
        };

        let arc = match arc_length(values, sampling_rate, nfft, settings, planner)? {
            Some(arc) => arc,
            None => return Ok(f64::NAN),
        };
        if let Some(prev) = previous {
            if (arc - prev).abs() <= settings.tolerance * prev.abs() {
                return Ok(arc);
            }
        }
        previous = Some(arc);
    }
    Ok(previous.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Minimum-jerk speed profile over `duration` seconds, zero elsewhere
    fn bump(t: f64, start: f64, duration: f64) -> f64 {
        let tau = (t - start) / duration;
        if (0.0..=1.0).contains(&tau) {
            30.0 * tau.powi(2) - 60.0 * tau.powi(3) + 30.0 * tau.powi(4)
        } else {
            0.0
        }
    }

    fn profile(fs: f64, seconds: f64, starts: &[f64]) -> Vec<f64> {
        let n = (seconds * fs) as usize + 1;
        (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                starts.iter().map(|&s| bump(t, s, 1.0)).sum()
            })
            .collect()
    }

    #[test]
    fn test_jerk_metric() {
        let slow: Vec<f64> = (0..200).map(|i| (2.0 * PI * i as f64 / 100.0).sin()).collect();
        let fast: Vec<f64> = (0..200).map(|i| (2.0 * PI * i as f64 / 10.0).sin()).collect();
        assert!(jerk_metric(&slow) < jerk_metric(&fast));
        assert_eq!(jerk_metric(&[2.0; 16]), 0.0);
        assert!(jerk_metric(&[0.0; 16]).is_nan());
    }

    #[test]
    fn test_dimensionless_jerk_prefers_smooth() {
        let fs = 100.0;
        let smooth = profile(fs, 1.0, &[0.0]);
        let shaky: Vec<f64> = smooth
            .iter()
            .enumerate()
            .map(|(i, &v)| v + if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();

        let d_smooth = dimensionless_jerk(&smooth, fs, false);
        let d_shaky = dimensionless_jerk(&shaky, fs, false);
        assert!(d_smooth < 0.0);
        assert!(d_smooth > d_shaky);
        assert!(dimensionless_jerk(&smooth, fs, true) > dimensionless_jerk(&shaky, fs, true));
        assert!(dimensionless_jerk(&[0.0; 10], fs, false).is_nan());
    }

    #[test]
    fn test_sparc_single_movement() {
        let mut planner = FftPlanner::new();
        let smooth = profile(100.0, 2.0, &[0.5]);
        let value = sparc(&smooth, 100.0, &SparcSettings::default(), &mut planner).unwrap();
        assert!(value < -1.0 && value > -2.0, "{value}");
    }

    #[test]
    fn test_sparc_penalizes_submovements() {
        let mut planner = FftPlanner::new();
        let settings = SparcSettings::default();
        let single = profile(100.0, 3.0, &[0.5]);
        let double = profile(100.0, 3.0, &[0.5, 1.3]);
        let s_single = sparc(&single, 100.0, &settings, &mut planner).unwrap();
        let s_double = sparc(&double, 100.0, &settings, &mut planner).unwrap();
        assert!(s_double < s_single, "{s_double} !< {s_single}");
    }

    #[test]
    fn test_sparc_terminates_and_caches_plans() {
        let mut planner = FftPlanner::new();
        let settings = SparcSettings {
            tolerance: 0.0,
            max_iterations: 3,
            ..SparcSettings::default()
        };
        let smooth = profile(50.0, 2.0, &[0.2]);
        let value = sparc(&smooth, 50.0, &settings, &mut planner).unwrap();
        assert!(value.is_finite());
        // One plan per padding level
        assert_eq!(planner.len(), 3);
    }

    #[test]
    fn test_pass_exponent_never_truncates() {
        // 100 samples pad to 2^7, plus padlevel
        assert_eq!(pass_exponent(100, 4, 0), Some(11));
        assert_eq!(pass_exponent(100, 4, 1), Some(12));
        // Padding stops at the cap after the first pass
        assert_eq!(pass_exponent(1 << 20, 4, 0), Some(MAX_SPARC_FFT_EXPONENT));
        assert_eq!(pass_exponent(1 << 20, 4, 1), None);
        // A window longer than the cap keeps its own length
        let long = (1 << MAX_SPARC_FFT_EXPONENT) + 5;
        assert_eq!(pass_exponent(long, 0, 0), Some(MAX_SPARC_FFT_EXPONENT + 1));
        assert_eq!(pass_exponent(long, 4, 0), Some(MAX_SPARC_FFT_EXPONENT + 1));
        assert_eq!(pass_exponent(long, 0, 1), None);
    }

    #[test]
    fn test_arc_length_rejects_short_transform() {
        let mut planner = FftPlanner::new();
        let values = [1.0; 10];
        let err = arc_length(&values, 10.0, 8, &SparcSettings::default(), &mut planner)
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::TooShort {
                required: 10,
                actual: 8
            }
        );
    }

    #[test]
    fn test_sparc_zero_signal() {
        let mut planner = FftPlanner::new();
        let value = sparc(&[0.0; 64], 64.0, &SparcSettings::default(), &mut planner).unwrap();
        assert!(value.is_nan());
    }
}
