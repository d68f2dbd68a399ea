use std::sync::Arc;

use damper_core::{DamperError, FeatureNormalizer, NormalizationProfile, WindowBuffer};
use proptest::prelude::*;

proptest! {
    #[test]
    fn snapshot_is_last_w_values_oldest_first(
        w in 1usize..64,
        extra in 0usize..200,
        seed in any::<u64>(),
    ) {
        let values: Vec<f64> = (0..w + extra)
            .map(|i| ((seed.wrapping_add(i as u64) % 10_007) as f64) * 0.5 - 2_000.0)
            .collect();
        let mut buf = WindowBuffer::new(w);
        for v in &values {
            buf.insert(*v);
        }
        let snap = buf.snapshot();
        prop_assert!(buf.is_filled());
        prop_assert_eq!(buf.insertions_past_fill(), Some(extra as u64));
        prop_assert_eq!(snap.len(), w);
        prop_assert_eq!(&snap[..], &values[extra..]);
        prop_assert_eq!(snap.last().copied(), values.last().copied());
    }

    #[test]
    fn not_filled_before_capacity_inserts(w in 2usize..64, n in 0usize..64) {
        prop_assume!(n < w);
        let mut buf = WindowBuffer::new(w);
        for i in 0..n {
            buf.insert(i as f64);
        }
        prop_assert!(!buf.is_filled());
        prop_assert_eq!(buf.insertions_past_fill(), None);
    }
}

fn profile(mean: Vec<f64>, scale: Vec<f64>) -> Arc<NormalizationProfile> {
    Arc::new(NormalizationProfile::new(mean, scale).unwrap())
}

#[test]
fn normalizing_the_mean_gives_zeros() {
    let mean = vec![0.98, 1.01, -0.5, 3.25];
    let n = FeatureNormalizer::new(profile(mean.clone(), vec![0.1, 2.0, 0.5, 4.0]), 4).unwrap();
    assert_eq!(n.normalize(&mean), vec![0.0; 4]);
}

#[test]
fn normalization_is_elementwise_affine() {
    let n = FeatureNormalizer::new(profile(vec![1.0, -1.0, 0.0], vec![2.0, 0.5, -4.0]), 3).unwrap();
    assert_eq!(n.normalize(&[3.0, 0.0, 2.0]), vec![1.0, 2.0, -0.5]);

    let mut out = vec![99.0; 7];
    n.normalize_into(&[1.0, -1.0, 0.0], &mut out);
    assert_eq!(out, vec![0.0, 0.0, 0.0]);
}

#[test]
fn profile_length_must_match_window() {
    let err = FeatureNormalizer::new(profile(vec![0.0; 49], vec![1.0; 49]), 50).unwrap_err();
    assert!(matches!(err, DamperError::Config(_)), "{err:?}");
}
