//! Standardization scaler exported from the training pipeline.
//!
//! JSON layout: `{ "feature_names": [...], "mean": [...], "scale": [...] }`,
//! i.e. the fitted `mean_` and `scale_` of a standard scaler.

use serde::{Deserialize, Serialize};

use super::ArtifactError;
use crate::ports::{FeatureScaler, ScoringError};

/// Per-column `(x - mean) / scale` transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the parameters are inconsistent.
    pub fn new(
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    ) -> Result<Self, ArtifactError> {
        let mut scaler = Self {
            feature_names,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Parse and validate an exported scaler.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the JSON is malformed or inconsistent.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let mut scaler: Self = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactError::Format(format!("scaler: {e}")))?;
        scaler.validate()?;
        Ok(scaler)
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn validate(&mut self) -> Result<(), ArtifactError> {
        let n = self.mean.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("scaler has no features".into()));
        }
        if self.scale.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "scaler mean has {n} entries but scale has {}",
                self.scale.len()
            )));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "scaler has {n} parameters but {} feature names",
                self.feature_names.len()
            )));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid(
                "scaler parameters must be finite".into(),
            ));
        }

        // Constant columns were fitted with a zero scale; divide by 1 instead.
        for s in &mut self.scale {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError> {
        if features.len() != self.mean.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.mean.len(),
                got: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}
