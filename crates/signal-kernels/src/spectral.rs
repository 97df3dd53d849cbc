//! FFT-based Frequency Analysis
//!
//! Features computed from the one-sided power spectrum `|X(k)|² / N`. Bin
//! resolution is `sampling_rate / N`; band edges snap to the nearest bin and
//! are inclusive. In-range power at or below `FLAT_TOLERANCE` of the total
//! counts as no power, so a constant window behaves like an all-zero one.

use crate::fft::FftPlan;
use crate::stats::FLAT_TOLERANCE;
use crate::KernelResult;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Window function applied before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taper {
    /// Rectangular window, samples used as given
    #[default]
    None,
    /// Hamming window to reduce spectral leakage
    Hamming,
}

impl Taper {
    /// Apply the window in place
    pub fn apply(&self, signal: &mut [f64]) {
        match self {
            Taper::None => {}
            Taper::Hamming => {
                let n = signal.len();
                if n < 2 {
                    return;
                }
                let step = 2.0 * std::f64::consts::PI / (n - 1) as f64;
                for (i, sample) in signal.iter_mut().enumerate() {
                    *sample *= 0.54 - 0.46 * (step * i as f64).cos();
                }
            }
        }
    }
}

/// Frequency range a spectral feature looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralRange {
    /// Lower edge (Hz)
    pub low_hz: f64,
    /// Upper edge (Hz); Nyquist when unset
    pub high_hz: Option<f64>,
    /// Whether bin 0 may take part
    pub include_dc: bool,
}

impl Default for SpectralRange {
    fn default() -> Self {
        Self {
            low_hz: 0.0,
            high_hz: None,
            include_dc: false,
        }
    }
}

/// One-sided power spectrum of a window
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    power: Vec<f64>,
    resolution: f64,
}

impl PowerSpectrum {
    /// Transform `signal` with `plan` after applying `taper`
    pub fn compute(
        plan: &FftPlan,
        signal: &[f64],
        sampling_rate: f64,
        taper: Taper,
    ) -> KernelResult<Self> {
        let power = match taper {
            Taper::None => plan.power_spectrum(signal)?,
            _ => {
                let mut windowed = signal.to_vec();
                taper.apply(&mut windowed);
                plan.power_spectrum(&windowed)?
            }
        };
        Ok(Self {
            power,
            resolution: plan.frequency_resolution(sampling_rate),
        })
    }

    /// Bin powers
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Number of bins
    pub fn bins(&self) -> usize {
        self.power.len()
    }

    /// Width of one bin (Hz)
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Centre frequency of `bin` (Hz)
    pub fn frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.resolution
    }

    /// Nearest bin to `frequency_hz`, clamped to the spectrum
    pub fn bin_of(&self, frequency_hz: f64) -> usize {
        let last = self.power.len().saturating_sub(1);
        let bin = (frequency_hz / self.resolution).round();
        if bin <= 0.0 {
            0
        } else {
            (bin as usize).min(last)
        }
    }

    fn bins_in(&self, range: &SpectralRange) -> Range<usize> {
        let mut low = self.bin_of(range.low_hz);
        let high = match range.high_hz {
            Some(hz) => self.bin_of(hz),
            None => self.power.len().saturating_sub(1),
        };
        if !range.include_dc {
            low = low.max(1);
        }
        if low > high {
            return 0..0;
        }
        low..high + 1
    }

    /// Sum of every bin, DC included
    pub fn total_power(&self) -> f64 {
        self.power.iter().sum()
    }

    /// Sum of bins between the snapped edges of `[low_hz, high_hz]`
    pub fn band_power(&self, low_hz: f64, high_hz: f64) -> f64 {
        let low = self.bin_of(low_hz);
        let high = self.bin_of(high_hz);
        if low > high {
            return 0.0;
        }
        self.power[low..=high].iter().sum()
    }

    /// Whether `power` is rounding noise next to the whole spectrum
    fn negligible(&self, power: f64) -> bool {
        power <= FLAT_TOLERANCE * self.total_power()
    }

    fn peak(&self, range: &SpectralRange) -> Option<(usize, f64)> {
        let bins = self.bins_in(range);
        let offset = bins.start;
        self.power[bins]
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((offset + i, p)),
            })
            .filter(|&(_, p)| !self.negligible(p))
    }

    /// Frequency of the strongest bin in `range`; `NaN` when the range holds no power
    pub fn dominant_frequency(&self, range: &SpectralRange) -> f64 {
        self.peak(range)
            .map(|(bin, _)| self.frequency(bin))
            .unwrap_or(f64::NAN)
    }

    /// Share of the in-range power held by the strongest bin; `NaN` without power
    pub fn dominant_frequency_value(&self, range: &SpectralRange) -> f64 {
        let total: f64 = self.power[self.bins_in(range)].iter().sum();
        match self.peak(range) {
            Some((_, p)) if total > 0.0 => p / total,
            _ => f64::NAN,
        }
    }

    /// Shannon entropy of the normalized in-range power.
    ///
    /// With `normalize` it is divided by `ln(bins)`. A range without power is
    /// treated as perfectly ordered and yields 0.0.
    pub fn spectral_entropy(&self, range: &SpectralRange, normalize: bool) -> f64 {
        let band = &self.power[self.bins_in(range)];
        let total: f64 = band.iter().sum();
        if self.negligible(total) || band.len() < 2 {
            return 0.0;
        }

        let entropy: f64 = band
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| {
                let q = p / total;
                -q * q.ln()
            })
            .sum();
        if normalize {
            entropy / (band.len() as f64).ln()
        } else {
            entropy
        }
    }

    /// Geometric over arithmetic mean of the in-range power; `NaN` without power
    pub fn spectral_flatness(&self, range: &SpectralRange) -> f64 {
        let band = &self.power[self.bins_in(range)];
        if band.is_empty() {
            return f64::NAN;
        }
        let n = band.len() as f64;
        let total: f64 = band.iter().sum();
        if self.negligible(total) {
            return f64::NAN;
        }
        let arithmetic = total / n;
        let geometric = (band.iter().map(|p| p.ln()).sum::<f64>() / n).exp();
        geometric / arithmetic
    }

    /// Power in `[low_hz, high_hz]` over total power; `NaN` for an all-zero spectrum
    pub fn band_power_ratio(&self, low_hz: f64, high_hz: f64) -> f64 {
        let total = self.total_power();
        if total <= 0.0 {
            return f64::NAN;
        }
        self.band_power(low_hz, high_hz) / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(n: usize, fs: f64, freq: f64, offset: f64) -> Vec<f64> {
        (0..n)
            .map(|i| offset + (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    fn spectrum(signal: &[f64], fs: f64) -> PowerSpectrum {
        let plan = FftPlan::new(signal.len()).unwrap();
        PowerSpectrum::compute(&plan, signal, fs, Taper::None).unwrap()
    }

    #[test]
    fn test_dominant_frequency_sine() {
        let ps = spectrum(&tone(256, 128.0, 10.0, 0.0), 128.0);
        let range = SpectralRange::default();
        assert!((ps.dominant_frequency(&range) - 10.0).abs() < 1e-12);
        assert_eq!(ps.bin_of(10.0), 20);
        assert!(ps.dominant_frequency_value(&range) > 0.99);
    }

    #[test]
    fn test_dc_excluded_unless_requested() {
        let ps = spectrum(&tone(256, 128.0, 10.0, 5.0), 128.0);
        let mut range = SpectralRange::default();
        assert!((ps.dominant_frequency(&range) - 10.0).abs() < 1e-12);
        range.include_dc = true;
        assert_eq!(ps.dominant_frequency(&range), 0.0);
    }

    #[test]
    fn test_range_limits_search() {
        let fs = 100.0;
        let signal: Vec<f64> = tone(200, fs, 5.0, 0.0)
            .iter()
            .zip(tone(200, fs, 20.0, 0.0))
            .map(|(a, b)| a + 0.5 * b)
            .collect();
        let ps = spectrum(&signal, fs);
        let high = SpectralRange {
            low_hz: 10.0,
            high_hz: Some(30.0),
            include_dc: false,
        };
        assert!((ps.dominant_frequency(&high) - 20.0).abs() < 1e-12);
        assert!((ps.dominant_frequency(&SpectralRange::default()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_spectral_entropy_orders_signals() {
        let pure = spectrum(&tone(128, 64.0, 8.0, 0.0), 64.0);
        let mut impulse = vec![0.0; 128];
        impulse[0] = 1.0;
        let flat = spectrum(&impulse, 64.0);

        let range = SpectralRange::default();
        assert!(pure.spectral_entropy(&range, true) < 0.01);
        assert!((flat.spectral_entropy(&range, true) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spectral_flatness() {
        let mut impulse = vec![0.0; 64];
        impulse[0] = 1.0;
        let flat = spectrum(&impulse, 32.0);
        assert!((flat.spectral_flatness(&SpectralRange::default()) - 1.0).abs() < 1e-12);

        let pure = spectrum(&tone(64, 32.0, 4.0, 0.0), 32.0);
        assert!(pure.spectral_flatness(&SpectralRange::default()) < 1e-6);
    }

    #[test]
    fn test_band_power_ratio() {
        let ps = spectrum(&tone(256, 128.0, 10.0, 0.0), 128.0);
        assert!((ps.band_power_ratio(9.0, 11.0) - 1.0).abs() < 1e-9);
        assert!(ps.band_power_ratio(20.0, 40.0) < 1e-9);
        // Edges snap: 10.2 Hz rounds to bin 20 (10.0 Hz)
        assert!((ps.band_power_ratio(10.2, 10.2) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_spectrum_sentinels() {
        let ps = spectrum(&[0.0; 32], 16.0);
        let range = SpectralRange::default();
        assert!(ps.dominant_frequency(&range).is_nan());
        assert!(ps.dominant_frequency_value(&range).is_nan());
        assert_eq!(ps.spectral_entropy(&range, true), 0.0);
        assert!(ps.spectral_flatness(&range).is_nan());
        assert!(ps.band_power_ratio(1.0, 4.0).is_nan());
    }

    #[test]
    fn test_constant_window_has_no_spectral_peak() {
        let ps = spectrum(&[3.0; 100], 50.0);
        let range = SpectralRange::default();
        assert!(ps.dominant_frequency(&range).is_nan());
        assert!(ps.dominant_frequency_value(&range).is_nan());
        assert_eq!(ps.spectral_entropy(&range, true), 0.0);
        assert!(ps.spectral_flatness(&range).is_nan());
        assert!((ps.band_power_ratio(0.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hamming_taper() {
        let mut signal = vec![1.0; 11];
        Taper::Hamming.apply(&mut signal);
        assert!((signal[0] - 0.08).abs() < 1e-12);
        assert!((signal[5] - 1.0).abs() < 1e-12);
        assert!((signal[10] - 0.08).abs() < 1e-12);

        let mut untouched = vec![1.0; 4];
        Taper::None.apply(&mut untouched);
        assert_eq!(untouched, vec![1.0; 4]);
    }
}
