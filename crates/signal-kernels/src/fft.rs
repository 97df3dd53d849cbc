//! Mixed-radix FFT for real-valued windows
//!
//! Lengths are factored into radix-4, 2, 3 and 5 stages plus a generic
//! butterfly for any other prime up to [`MAX_RADIX`]. A length with a larger
//! prime factor goes through Bluestein's chirp-z transform on a power-of-two
//! inner plan, so no length degrades to a quadratic DFT.
//!
//! Real input of even length is packed into a half-length complex transform;
//! odd lengths run the full complex transform. Plans precompute their twiddle
//! tables and are shared through [`FftPlanner`].

use crate::{KernelError, KernelResult};
use num_complex::Complex64;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;

/// Largest prime handled by a butterfly; larger prime factors use Bluestein
pub const MAX_RADIX: usize = 31;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

#[inline]
fn unit(angle: f64) -> Complex64 {
    Complex64::new(angle.cos(), angle.sin())
}

/// Split `len` into `(radix, remaining)` stages, radix 4 first.
fn factorize(len: usize) -> Vec<(usize, usize)> {
    let mut stages = Vec::new();
    let floor_sqrt = (len as f64).sqrt().floor() as usize;
    let mut n = len;
    let mut p = 4;
    while n > 1 {
        while n % p != 0 {
            p = match p {
                4 => 2,
                2 => 3,
                _ => p + 2,
            };
            if p > floor_sqrt {
                p = n;
            }
        }
        n /= p;
        stages.push((p, n));
    }
    stages
}

/// Decimation-in-time mixed-radix transform (unnormalized, forward)
#[derive(Debug, Clone)]
struct MixedRadix {
    len: usize,
    stages: Vec<(usize, usize)>,
    twiddles: Vec<Complex64>,
}

impl MixedRadix {
    fn new(len: usize, stages: Vec<(usize, usize)>) -> Self {
        let twiddles = (0..len)
            .map(|k| unit(-2.0 * PI * k as f64 / len as f64))
            .collect();
        Self {
            len,
            stages,
            twiddles,
        }
    }

    fn process(&self, input: &[Complex64], output: &mut [Complex64]) {
        if self.stages.is_empty() {
            output.copy_from_slice(input);
            return;
        }
        self.work(output, input, 0, 1, 0);
    }

    fn work(
        &self,
        out: &mut [Complex64],
        input: &[Complex64],
        start: usize,
        fstride: usize,
        stage: usize,
    ) {
        let (p, m) = self.stages[stage];
        if m == 1 {
            for (i, slot) in out[..p].iter_mut().enumerate() {
                *slot = input[start + i * fstride];
            }
        } else {
            for i in 0..p {
                self.work(
                    &mut out[i * m..(i + 1) * m],
                    input,
                    start + i * fstride,
                    fstride * p,
                    stage + 1,
                );
            }
        }

        match p {
            2 => self.butterfly2(out, fstride, m),
            3 => self.butterfly3(out, fstride, m),
            4 => self.butterfly4(out, fstride, m),
            5 => self.butterfly5(out, fstride, m),
            _ => self.butterfly_generic(out, fstride, m, p),
        }
    }

    fn butterfly2(&self, out: &mut [Complex64], fstride: usize, m: usize) {
        for k in 0..m {
            let t = out[k + m] * self.twiddles[k * fstride];
            out[k + m] = out[k] - t;
            out[k] += t;
        }
    }

    fn butterfly3(&self, out: &mut [Complex64], fstride: usize, m: usize) {
        let epi3 = self.twiddles[fstride * m].im;
        for k in 0..m {
            let s1 = out[k + m] * self.twiddles[k * fstride];
            let s2 = out[k + 2 * m] * self.twiddles[2 * k * fstride];
            let s3 = s1 + s2;
            let s0 = (s1 - s2) * epi3;

            let a = out[k];
            let half = a - s3 * 0.5;
            out[k] = a + s3;
            out[k + m] = Complex64::new(half.re - s0.im, half.im + s0.re);
            out[k + 2 * m] = Complex64::new(half.re + s0.im, half.im - s0.re);
        }
    }

    fn butterfly4(&self, out: &mut [Complex64], fstride: usize, m: usize) {
        for k in 0..m {
            let s0 = out[k + m] * self.twiddles[k * fstride];
            let s1 = out[k + 2 * m] * self.twiddles[2 * k * fstride];
            let s2 = out[k + 3 * m] * self.twiddles[3 * k * fstride];

            let a = out[k];
            let s5 = a - s1;
            let a = a + s1;
            let s3 = s0 + s2;
            let s4 = s0 - s2;

            out[k] = a + s3;
            out[k + 2 * m] = a - s3;
            out[k + m] = Complex64::new(s5.re + s4.im, s5.im - s4.re);
            out[k + 3 * m] = Complex64::new(s5.re - s4.im, s5.im + s4.re);
        }
    }

    fn butterfly5(&self, out: &mut [Complex64], fstride: usize, m: usize) {
        let ya = self.twiddles[fstride * m];
        let yb = self.twiddles[2 * fstride * m];
        for u in 0..m {
            let s0 = out[u];
            let s1 = out[u + m] * self.twiddles[u * fstride];
            let s2 = out[u + 2 * m] * self.twiddles[2 * u * fstride];
            let s3 = out[u + 3 * m] * self.twiddles[3 * u * fstride];
            let s4 = out[u + 4 * m] * self.twiddles[4 * u * fstride];

            let s7 = s1 + s4;
            let s10 = s1 - s4;
            let s8 = s2 + s3;
            let s9 = s2 - s3;

            out[u] = s0 + s7 + s8;

            let s5 = Complex64::new(
                s0.re + s7.re * ya.re + s8.re * yb.re,
                s0.im + s7.im * ya.re + s8.im * yb.re,
            );
            let s6 = Complex64::new(
                s10.im * ya.im + s9.im * yb.im,
                -(s10.re * ya.im + s9.re * yb.im),
            );
            out[u + m] = s5 - s6;
            out[u + 4 * m] = s5 + s6;

            let s11 = Complex64::new(
                s0.re + s7.re * yb.re + s8.re * ya.re,
                s0.im + s7.im * yb.re + s8.im * ya.re,
            );
            let s12 = Complex64::new(
                -s10.im * yb.im + s9.im * ya.im,
                s10.re * yb.im - s9.re * ya.im,
            );
            out[u + 2 * m] = s11 + s12;
            out[u + 3 * m] = s11 - s12;
        }
    }

    fn butterfly_generic(&self, out: &mut [Complex64], fstride: usize, m: usize, p: usize) {
        let mut scratch = vec![ZERO; p];
        for u in 0..m {
            for (q, slot) in scratch.iter_mut().enumerate() {
                *slot = out[u + q * m];
            }
            for q1 in 0..p {
                let k = u + q1 * m;
                let mut twidx = 0;
                let mut acc = scratch[0];
                for &value in &scratch[1..] {
                    twidx += fstride * k;
                    if twidx >= self.len {
                        twidx -= self.len;
                    }
                    acc += value * self.twiddles[twidx];
                }
                out[k] = acc;
            }
        }
    }
}

/// Chirp-z transform for lengths with a prime factor above [`MAX_RADIX`]
#[derive(Debug, Clone)]
struct Bluestein {
    len: usize,
    inner: MixedRadix,
    chirp: Vec<Complex64>,
    kernel: Vec<Complex64>,
}

impl Bluestein {
    fn new(len: usize) -> Self {
        let conv_len = (2 * len - 1).next_power_of_two();
        let inner = MixedRadix::new(conv_len, factorize(conv_len));

        // k^2 is reduced mod 2n before scaling to keep the angle exact for large k
        let modulus = 2 * len as u64;
        let chirp: Vec<Complex64> = (0..len as u64)
            .map(|k| {
                let k2 = (k * k) % modulus;
                unit(-PI * k2 as f64 / len as f64)
            })
            .collect();

        let mut b = vec![ZERO; conv_len];
        b[0] = chirp[0].conj();
        for k in 1..len {
            b[k] = chirp[k].conj();
            b[conv_len - k] = chirp[k].conj();
        }
        let mut kernel = vec![ZERO; conv_len];
        inner.process(&b, &mut kernel);

        Self {
            len,
            inner,
            chirp,
            kernel,
        }
    }

    fn process(&self, input: &[Complex64], output: &mut [Complex64]) {
        let conv_len = self.inner.len;
        let mut a = vec![ZERO; conv_len];
        for ((slot, &x), &w) in a.iter_mut().zip(input).zip(&self.chirp) {
            *slot = x * w;
        }

        let mut spectrum = vec![ZERO; conv_len];
        self.inner.process(&a, &mut spectrum);
        for (s, &k) in spectrum.iter_mut().zip(&self.kernel) {
            *s = (*s * k).conj();
        }

        // Inverse through the forward transform: ifft(X) = conj(fft(conj(X))) / n
        self.inner.process(&spectrum, &mut a);
        let scale = 1.0 / conv_len as f64;
        for ((slot, &c), &w) in output[..self.len].iter_mut().zip(&a).zip(&self.chirp) {
            *slot = w * c.conj() * scale;
        }
    }
}

#[derive(Debug, Clone)]
enum Algorithm {
    MixedRadix(MixedRadix),
    Bluestein(Box<Bluestein>),
}

/// Complex-to-complex DFT of a fixed length.
#[derive(Debug, Clone)]
pub struct ComplexFft {
    len: usize,
    algorithm: Algorithm,
}

impl ComplexFft {
    /// Build a plan for `len` points
    pub fn new(len: usize) -> KernelResult<Self> {
        if len == 0 {
            return Err(KernelError::TooShort {
                required: 1,
                actual: 0,
            });
        }

        let stages = factorize(len);
        let largest = stages.iter().map(|&(p, _)| p).max().unwrap_or(1);
        let algorithm = if largest > MAX_RADIX {
            Algorithm::Bluestein(Box::new(Bluestein::new(len)))
        } else {
            Algorithm::MixedRadix(MixedRadix::new(len, stages))
        };
        Ok(Self { len, algorithm })
    }

    /// Transform length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; plans have at least one point
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Name of the algorithm backing this plan
    pub fn algorithm(&self) -> &'static str {
        match self.algorithm {
            Algorithm::MixedRadix(_) => "mixed-radix",
            Algorithm::Bluestein(_) => "bluestein",
        }
    }

    fn check(&self, actual: usize) -> KernelResult<()> {
        if actual != self.len {
            return Err(KernelError::LengthMismatch {
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }

    fn process(&self, input: &[Complex64], output: &mut [Complex64]) {
        match &self.algorithm {
            Algorithm::MixedRadix(plan) => plan.process(input, output),
            Algorithm::Bluestein(plan) => plan.process(input, output),
        }
    }

    /// Unnormalized forward transform, in place
    pub fn forward(&self, buf: &mut [Complex64]) -> KernelResult<()> {
        self.check(buf.len())?;
        let input = buf.to_vec();
        self.process(&input, buf);
        Ok(())
    }

    /// Inverse transform scaled by `1 / len`, in place
    pub fn inverse(&self, buf: &mut [Complex64]) -> KernelResult<()> {
        self.check(buf.len())?;
        let input: Vec<Complex64> = buf.iter().map(|c| c.conj()).collect();
        self.process(&input, buf);
        let scale = 1.0 / self.len as f64;
        for c in buf.iter_mut() {
            *c = c.conj() * scale;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RealKind {
    /// Even length: half-length complex transform plus split twiddles
    Packed {
        half: ComplexFft,
        split: Vec<Complex64>,
    },
    /// Odd length: full complex transform of the zero-imaginary input
    Full(ComplexFft),
}

/// Precomputed plan for the real-input DFT of one length.
///
/// Forward output is the one-sided spectrum: `len / 2 + 1` unnormalized bins.
#[derive(Debug, Clone)]
pub struct FftPlan {
    len: usize,
    kind: RealKind,
}

impl FftPlan {
    /// Build a plan for real windows of `len` samples
    pub fn new(len: usize) -> KernelResult<Self> {
        if len == 0 {
            return Err(KernelError::TooShort {
                required: 1,
                actual: 0,
            });
        }

        let kind = if len % 2 == 0 {
            let half = ComplexFft::new(len / 2)?;
            let split = (0..=len / 2)
                .map(|k| unit(-2.0 * PI * k as f64 / len as f64))
                .collect();
            RealKind::Packed { half, split }
        } else {
            RealKind::Full(ComplexFft::new(len)?)
        };
        Ok(Self { len, kind })
    }

    /// Number of real samples per transform
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; plans have at least one point
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of one-sided spectrum bins, `len / 2 + 1`
    pub fn bins(&self) -> usize {
        self.len / 2 + 1
    }

    /// Name of the complex algorithm backing this plan
    pub fn algorithm(&self) -> &'static str {
        match &self.kind {
            RealKind::Packed { half, .. } => half.algorithm(),
            RealKind::Full(full) => full.algorithm(),
        }
    }

    /// Width of one spectrum bin in Hz
    pub fn frequency_resolution(&self, sampling_rate: f64) -> f64 {
        sampling_rate / self.len as f64
    }

    /// One-sided forward transform of a real window
    pub fn forward(&self, input: &[f64]) -> KernelResult<Vec<Complex64>> {
        if input.len() != self.len {
            return Err(KernelError::LengthMismatch {
                expected: self.len,
                actual: input.len(),
            });
        }

        match &self.kind {
            RealKind::Packed { half, split } => {
                let h = half.len();
                let mut z: Vec<Complex64> = input
                    .chunks_exact(2)
                    .map(|pair| Complex64::new(pair[0], pair[1]))
                    .collect();
                half.forward(&mut z)?;

                let minus_half_i = Complex64::new(0.0, -0.5);
                let spectrum = (0..=h)
                    .map(|k| {
                        let zk = z[k % h];
                        let znk = z[(h - k) % h].conj();
                        let even = (zk + znk) * 0.5;
                        let odd = (zk - znk) * minus_half_i;
                        even + split[k] * odd
                    })
                    .collect();
                Ok(spectrum)
            }
            RealKind::Full(full) => {
                let mut buf: Vec<Complex64> =
                    input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
                full.forward(&mut buf)?;
                buf.truncate(self.bins());
                Ok(buf)
            }
        }
    }

    /// Reconstruct the real window from its one-sided spectrum
    pub fn inverse(&self, spectrum: &[Complex64]) -> KernelResult<Vec<f64>> {
        if spectrum.len() != self.bins() {
            return Err(KernelError::LengthMismatch {
                expected: self.bins(),
                actual: spectrum.len(),
            });
        }

        match &self.kind {
            RealKind::Packed { half, split } => {
                let h = half.len();
                let i = Complex64::new(0.0, 1.0);
                let mut z: Vec<Complex64> = (0..h)
                    .map(|k| {
                        let xk = spectrum[k];
                        let xnk = spectrum[h - k].conj();
                        let even = (xk + xnk) * 0.5;
                        let odd = (xk - xnk) * split[k].conj() * 0.5;
                        even + i * odd
                    })
                    .collect();
                half.inverse(&mut z)?;
                Ok(z.iter().flat_map(|c| [c.re, c.im]).collect())
            }
            RealKind::Full(full) => {
                let mut buf = vec![ZERO; self.len];
                buf[..spectrum.len()].copy_from_slice(spectrum);
                for k in 1..spectrum.len() {
                    buf[self.len - k] = spectrum[k].conj();
                }
                full.inverse(&mut buf)?;
                Ok(buf.iter().map(|c| c.re).collect())
            }
        }
    }

    /// One-sided power spectrum `|X(k)|^2 / len`
    pub fn power_spectrum(&self, input: &[f64]) -> KernelResult<Vec<f64>> {
        let scale = 1.0 / self.len as f64;
        Ok(self
            .forward(input)?
            .iter()
            .map(|c| c.norm_sqr() * scale)
            .collect())
    }

    /// One-sided magnitude spectrum `|X(k)|`
    pub fn magnitude(&self, input: &[f64]) -> KernelResult<Vec<f64>> {
        Ok(self.forward(input)?.iter().map(|c| c.norm()).collect())
    }
}

/// Cache of real FFT plans keyed by length.
///
/// Owned by one computation context; plans are built on first use and shared
/// as `Arc` so kernels can hold one while the planner is borrowed again.
#[derive(Debug, Default)]
pub struct FftPlanner {
    plans: HashMap<usize, Arc<FftPlan>>,
}

impl FftPlanner {
    /// Create an empty planner
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the plan for `len`, building it on first request
    pub fn plan(&mut self, len: usize) -> KernelResult<Arc<FftPlan>> {
        if let Some(plan) = self.plans.get(&len) {
            return Ok(Arc::clone(plan));
        }

        let plan = Arc::new(FftPlan::new(len)?);
        debug!(len, algorithm = plan.algorithm(), "Built FFT plan");
        self.plans.insert(len, Arc::clone(&plan));
        Ok(plan)
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether no plan has been built yet
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop every cached plan
    pub fn clear(&mut self) {
        self.plans.clear();
    }
}
