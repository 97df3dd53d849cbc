//! Request to kernel dispatch

use crate::{ComputeContext, FeatureRequest, FeatureResult, SignalWindow};
use signal_kernels::{entropy, order, smoothness, stats, PowerSpectrum, StatisticalFeatures};

/// Power spectrum of `window` through the context's plan cache and taper
fn spectrum(window: SignalWindow<'_>, ctx: &mut ComputeContext) -> FeatureResult<PowerSpectrum> {
    let taper = ctx.taper();
    let plan = ctx.planner().plan(window.len())?;
    Ok(PowerSpectrum::compute(
        &plan,
        window.samples(),
        window.sampling_rate(),
        taper,
    )?)
}

/// Compute one validated request over one window
pub(crate) fn compute(
    request: &FeatureRequest,
    window: SignalWindow<'_>,
    ctx: &mut ComputeContext,
) -> FeatureResult<f64> {
    let x = window.samples();
    let fs = window.sampling_rate();

    let value = match request {
        FeatureRequest::Mean => stats::mean(x),
        FeatureRequest::Variance => StatisticalFeatures::compute(x).variance,
        FeatureRequest::StdDev => StatisticalFeatures::compute(x).std_dev,
        FeatureRequest::Skewness => StatisticalFeatures::compute(x).skewness,
        FeatureRequest::Kurtosis => StatisticalFeatures::compute(x).kurtosis,
        FeatureRequest::Range => stats::range(x),
        FeatureRequest::Iqr => order::iqr(ctx.scratch_copy(x))?,
        FeatureRequest::Median => order::median(ctx.scratch_copy(x))?,
        FeatureRequest::Percentile(p) => order::percentile(ctx.scratch_copy(x), p.p)?,
        FeatureRequest::Rms => stats::rms(x),
        FeatureRequest::ZeroCrossings => stats::zero_crossings(x) as f64,
        FeatureRequest::MeanCrossings => stats::mean_crossings(x) as f64,
        FeatureRequest::MeanCrossRate => stats::mean_cross_rate(x),
        FeatureRequest::Autocorrelation(p) => stats::autocorrelation(x, p.lag, p.normalize),
        FeatureRequest::LinearSlope => stats::linear_slope(x, fs),
        FeatureRequest::ComplexityInvariantDistance(p) => {
            stats::complexity_invariant_distance(x, p.normalize)
        }
        FeatureRequest::RangeCountPercentage(p) => stats::range_count_percentage(x, p.min, p.max),
        FeatureRequest::RatioBeyondRSigma(p) => stats::ratio_beyond_r_sigma(x, p.r),
        FeatureRequest::SignalEntropy(p) => entropy::signal_entropy(x, p.bins),
        FeatureRequest::SampleEntropy(p) => entropy::sample_entropy(x, p.m, p.r),
        FeatureRequest::PermutationEntropy(p) => {
            entropy::permutation_entropy(x, p.order, p.delay, p.normalize)
        }
        FeatureRequest::SvdEntropy(p) => entropy::svd_entropy(x, p.order, p.delay, p.normalize),
        FeatureRequest::DominantFrequency(range) => {
            spectrum(window, ctx)?.dominant_frequency(range)
        }
        FeatureRequest::DominantFrequencyValue(range) => {
            spectrum(window, ctx)?.dominant_frequency_value(range)
        }
        FeatureRequest::SpectralEntropy(p) => {
            spectrum(window, ctx)?.spectral_entropy(&p.range(), p.normalize)
        }
        FeatureRequest::SpectralFlatness(range) => spectrum(window, ctx)?.spectral_flatness(range),
        FeatureRequest::BandPowerRatio(p) => {
            spectrum(window, ctx)?.band_power_ratio(p.low_hz, p.high_hz)
        }
        FeatureRequest::JerkMetric => smoothness::jerk_metric(x),
        FeatureRequest::DimensionlessJerk(p) => smoothness::dimensionless_jerk(x, fs, p.log),
        FeatureRequest::Sparc(settings) => smoothness::sparc(x, fs, settings, ctx.planner())?,
    };
    Ok(value)
}
