//! Batch feature computation

use crate::dispatch;
use crate::{
    ComputeContext, EngineConfig, FeatureMatrix, FeatureRequest, FeatureResult, WindowBatch,
};
use tracing::{debug, info, warn};

/// Computes feature requests over window batches
#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    config: EngineConfig,
}

impl FeatureEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        info!(
            "Creating feature engine: taper={:?}, parallel={}, bank={} features",
            config.taper,
            config.parallel,
            config.features.len()
        );
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check every request against the batch shape without computing anything
    pub fn validate(
        &self,
        batch: &WindowBatch<'_>,
        requests: &[FeatureRequest],
    ) -> FeatureResult<()> {
        let n = batch.samples_per_window();
        let fs = batch.sampling_rate();
        for request in requests {
            if let Err(e) = request.validate(n, fs) {
                warn!("Rejecting batch: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Compute `requests` for every window and axis of `batch`.
    ///
    /// All requests are validated first; any failure aborts the whole batch.
    /// Features are computed one column at a time so FFT plans are built once
    /// per batch and reused across windows.
    pub fn compute_features(
        &self,
        batch: &WindowBatch<'_>,
        requests: &[FeatureRequest],
    ) -> FeatureResult<FeatureMatrix> {
        self.validate(batch, requests)?;

        let kinds = requests.iter().map(FeatureRequest::kind).collect();
        let mut matrix = FeatureMatrix::new(batch.window_count(), batch.axis_count(), kinds);
        info!(
            "Computing features: windows={}, axes={}, samples={}, features={}",
            batch.window_count(),
            batch.axis_count(),
            batch.samples_per_window(),
            requests.len()
        );

        let mut ctx = ComputeContext::new(self.config.taper);
        for (feature, request) in requests.iter().enumerate() {
            let column = self.compute_column(batch, request, &mut ctx)?;
            let undefined = column.iter().filter(|v| v.is_nan()).count();

            let axes = batch.axis_count();
            for (cell, value) in column.into_iter().enumerate() {
                matrix.set(cell / axes, cell % axes, feature, value);
            }

            debug!("Computed {} ({} undefined cells)", request.kind(), undefined);
            if undefined > 0 && undefined == batch.cell_count() {
                warn!("{} is undefined for every window", request.kind());
            }
        }

        debug!("Batch used {} FFT plans", ctx.cached_plans());
        Ok(matrix)
    }

    /// Compute the configured feature bank
    pub fn compute_bank(&self, batch: &WindowBatch<'_>) -> FeatureResult<FeatureMatrix> {
        self.compute_features(batch, &self.config.features)
    }

    /// One feature over every `(window, axis)` cell, window-major
    fn compute_column(
        &self,
        batch: &WindowBatch<'_>,
        request: &FeatureRequest,
        ctx: &mut ComputeContext,
    ) -> FeatureResult<Vec<f64>> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return self.compute_column_parallel(batch, request);
        }

        (0..batch.cell_count())
            .map(|cell| match batch.cell(cell) {
                Some(window) => dispatch::compute(request, window, ctx),
                None => Ok(f64::NAN),
            })
            .collect()
    }

    /// Column across the rayon pool; every worker owns its context
    #[cfg(feature = "parallel")]
    fn compute_column_parallel(
        &self,
        batch: &WindowBatch<'_>,
        request: &FeatureRequest,
    ) -> FeatureResult<Vec<f64>> {
        use rayon::prelude::*;

        let taper = self.config.taper;
        (0..batch.cell_count())
            .into_par_iter()
            .map_init(
                || ComputeContext::new(taper),
                |ctx, cell| match batch.cell(cell) {
                    Some(window) => dispatch::compute(request, window, ctx),
                    None => Ok(f64::NAN),
                },
            )
            .collect()
    }
}

/// Compute `requests` over `batch` with the default configuration
pub fn compute_features(
    batch: &WindowBatch<'_>,
    requests: &[FeatureRequest],
) -> FeatureResult<FeatureMatrix> {
    FeatureEngine::default().compute_features(batch, requests)
}
