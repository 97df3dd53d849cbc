//! Shape and bound properties of batch computation

use feature_engine::{compute_features, FeatureRequest, WindowBatch};
use proptest::prelude::*;

fn batch_strategy() -> impl Strategy<Value = (usize, usize, Vec<Vec<f64>>)> {
    (2usize..48, 1usize..5, 1usize..4).prop_flat_map(|(n, windows, axes)| {
        let axis = proptest::collection::vec(-1e3f64..1e3, n * windows);
        (
            Just(n),
            Just(windows),
            proptest::collection::vec(axis, axes),
        )
    })
}

proptest! {
    #[test]
    fn matrix_shape_matches_batch((n, windows, axes) in batch_strategy()) {
        let batch = WindowBatch::new(axes.iter().map(Vec::as_slice).collect(), n, 25.0).unwrap();
        let requests = [FeatureRequest::Mean, FeatureRequest::Rms, FeatureRequest::Iqr];
        let matrix = compute_features(&batch, &requests).unwrap();
        prop_assert_eq!(matrix.shape(), (windows, axes.len(), requests.len()));
        prop_assert_eq!(matrix.as_slice().len(), windows * axes.len() * requests.len());
    }

    #[test]
    fn order_statistics_within_window_bounds(
        (n, windows, axes) in batch_strategy(),
        p in 0.0f64..=100.0,
    ) {
        let batch = WindowBatch::new(axes.iter().map(Vec::as_slice).collect(), n, 25.0).unwrap();
        let requests = [FeatureRequest::percentile(p), FeatureRequest::Median];
        let matrix = compute_features(&batch, &requests).unwrap();

        for w in 0..windows {
            for a in 0..axes.len() {
                let window = &axes[a][w * n..(w + 1) * n];
                let min = window.iter().copied().fold(f64::INFINITY, f64::min);
                let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                for value in matrix.row(w, a).unwrap() {
                    prop_assert!(*value >= min && *value <= max);
                }
            }
        }
    }

    #[test]
    fn sample_entropy_length_rule(n in 2usize..12, m in 1usize..12) {
        let x = vec![0.0; n];
        let batch = WindowBatch::single_axis(&x, n, 10.0).unwrap();
        let result = compute_features(&batch, &[FeatureRequest::sample_entropy(m, 0.2)]);
        prop_assert_eq!(result.is_ok(), m + 1 < n);
    }
}
