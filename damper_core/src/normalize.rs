//! Per-position standardization of a window snapshot.

use std::sync::Arc;

use crate::error::DamperError;

/// Mean and scale per window position, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationProfile {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl NormalizationProfile {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, DamperError> {
        if mean.len() != scale.len() {
            return Err(DamperError::Config(format!(
                "profile mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.is_empty() {
            return Err(DamperError::Config("profile is empty".into()));
        }
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(DamperError::Config("profile mean must be finite".into()));
        }
        if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(DamperError::Config(
                "profile scale must be finite and non-zero".into(),
            ));
        }
        Ok(Self { mean, scale })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// Applies `(value - mean) / scale` elementwise.
///
/// Construction checks the profile against the window capacity, so a
/// mismatch is caught at startup and `normalize_into` never has to.
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    profile: Arc<NormalizationProfile>,
}

impl FeatureNormalizer {
    pub fn new(profile: Arc<NormalizationProfile>, window: usize) -> Result<Self, DamperError> {
        if profile.len() != window {
            return Err(DamperError::Config(format!(
                "normalization profile has {} positions but the window holds {}",
                profile.len(),
                window
            )));
        }
        Ok(Self { profile })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.profile.len()
    }

    /// Write the feature vector for `window` into `out`.
    pub fn normalize_into(&self, window: &[f64], out: &mut Vec<f64>) {
        debug_assert_eq!(window.len(), self.width());
        out.clear();
        out.extend(
            window
                .iter()
                .zip(self.profile.mean.iter().zip(&self.profile.scale))
                .map(|(v, (m, s))| (v - m) / s),
        );
    }

    pub fn normalize(&self, window: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        self.normalize_into(window, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_and_degenerate_profiles() {
        assert!(NormalizationProfile::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(NormalizationProfile::new(vec![], vec![]).is_err());
        assert!(NormalizationProfile::new(vec![0.0], vec![0.0]).is_err());
        assert!(NormalizationProfile::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn width_mismatch_is_a_config_error() {
        let p = Arc::new(NormalizationProfile::new(vec![0.0; 4], vec![1.0; 4]).unwrap());
        match FeatureNormalizer::new(p, 5) {
            Err(DamperError::Config(msg)) => assert!(msg.contains("4 positions")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
