//! Scoring ports: Traits for the fitted scaler and the risk model.
//!
//! These traits abstract the serialized artifacts from the application logic.
//! Both collaborators are loaded once at startup and only read afterwards.

/// Errors raised while scaling or scoring a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("Feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model produced an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Model evaluation failed: {0}")]
    Model(String),
}

/// Pre-fitted feature transform applied before scoring.
pub trait FeatureScaler: Send + Sync {
    /// Number of columns the scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Transform one raw feature vector.
    ///
    /// # Errors
    /// Returns `ScoringError::DimensionMismatch` if `features` has the wrong
    /// length.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError>;
}

/// Binary classifier producing class probabilities.
pub trait RiskModel: Send + Sync {
    /// Number of input columns the model expects.
    fn n_features(&self) -> usize;

    /// Short identifier of the model family (for health reporting).
    fn kind(&self) -> &'static str;

    /// Class probabilities `[P(negative), P(positive)]` for one scaled vector.
    ///
    /// # Errors
    /// Returns `ScoringError` if the vector has the wrong length or the model
    /// cannot be evaluated.
    fn predict_proba(&self, scaled: &[f64]) -> Result<[f64; 2], ScoringError>;
}
