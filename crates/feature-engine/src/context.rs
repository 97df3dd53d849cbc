//! Per-batch computation context

use signal_kernels::{FftPlanner, Taper};

/// Mutable state shared by the kernels of one batch on one thread.
///
/// Holds the FFT plan cache and a scratch buffer for kernels that reorder
/// their input. Created at the start of a batch call and dropped at its end;
/// parallel workers each get their own.
#[derive(Debug, Default)]
pub struct ComputeContext {
    planner: FftPlanner,
    scratch: Vec<f64>,
    taper: Taper,
}

impl ComputeContext {
    /// Create a context applying `taper` before spectral transforms
    pub fn new(taper: Taper) -> Self {
        Self {
            planner: FftPlanner::new(),
            scratch: Vec::new(),
            taper,
        }
    }

    /// Spectral taper
    pub fn taper(&self) -> Taper {
        self.taper
    }

    /// FFT plan cache
    pub fn planner(&mut self) -> &mut FftPlanner {
        &mut self.planner
    }

    /// Copy `samples` into the scratch buffer and hand it out for reordering
    pub fn scratch_copy(&mut self, samples: &[f64]) -> &mut [f64] {
        self.scratch.clear();
        self.scratch.extend_from_slice(samples);
        &mut self.scratch
    }

    /// Number of cached FFT plans
    pub fn cached_plans(&self) -> usize {
        self.planner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_leaves_input_untouched() {
        let mut ctx = ComputeContext::new(Taper::None);
        let samples = [3.0, 1.0, 2.0];
        let buf = ctx.scratch_copy(&samples);
        buf.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(buf, &[1.0, 2.0, 3.0]);
        assert_eq!(samples, [3.0, 1.0, 2.0]);

        // Reuse shrinks to the new window
        assert_eq!(ctx.scratch_copy(&[9.0]).len(), 1);
    }

    #[test]
    fn test_plans_cached_per_context() {
        let mut ctx = ComputeContext::default();
        ctx.planner().plan(64).unwrap();
        ctx.planner().plan(64).unwrap();
        ctx.planner().plan(100).unwrap();
        assert_eq!(ctx.cached_plans(), 2);
    }
}
