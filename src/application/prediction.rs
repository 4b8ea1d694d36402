//! Prediction service: Orchestrates one risk assessment.
//!
//! This service coordinates:
//! - Input coercion and validation
//! - Category derivation and feature assembly
//! - Scaling and model scoring
//! - Risk bucketing and recommendation lookup

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{
    DerivedFeatures, MessageCatalog, PatientInput, Prediction, PredictionResponse,
    Recommendations, RiskCategory,
};
use crate::ports::{FeatureScaler, RiskModel, ScoringError};
use crate::CardioriskError;

/// Service for scoring patients against the loaded artifacts.
///
/// All collaborators are injected at construction and only read afterwards,
/// so one instance can be shared across request handlers.
pub struct PredictionService<S, M>
where
    S: FeatureScaler,
    M: RiskModel,
{
    scaler: Arc<S>,
    model: Arc<M>,
    catalog: Arc<MessageCatalog>,
}

impl<S, M> PredictionService<S, M>
where
    S: FeatureScaler,
    M: RiskModel,
{
    /// Create a new prediction service.
    pub fn new(scaler: Arc<S>, model: Arc<M>, catalog: Arc<MessageCatalog>) -> Self {
        Self {
            scaler,
            model,
            catalog,
        }
    }

    #[must_use]
    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    #[must_use]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Score a raw JSON payload.
    ///
    /// # Errors
    /// Returns `InvalidInput` for missing or uncoercible fields and `Scoring`
    /// if the scaler or model rejects the vector.
    pub fn predict(&self, payload: &Value) -> Result<Prediction, CardioriskError> {
        let input = PatientInput::from_json(payload)?;
        self.predict_input(&input)
    }

    /// Score an already coerced input.
    ///
    /// # Errors
    /// See [`PredictionService::predict`].
    pub fn predict_input(&self, input: &PatientInput) -> Result<Prediction, CardioriskError> {
        let features = DerivedFeatures::derive(input)?;
        tracing::debug!(categories = ?features.categories, "Features derived");

        let scaled = self.scaler.transform(features.as_slice())?;
        let [_, probability] = self.model.predict_proba(&scaled)?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvalidProbability(probability).into());
        }

        let risk_category = RiskCategory::from_probability(probability);
        let categories = features.categories;
        let catalog = &self.catalog;

        let prediction = Prediction {
            probability,
            risk_category,
            risk_label: catalog.risk_label(risk_category).to_string(),
            categories,
            recommendations: Recommendations {
                blood_pressure: catalog
                    .blood_pressure_text(categories.blood_pressure)
                    .to_string(),
                bmi: catalog.bmi_text(categories.bmi).to_string(),
                cholesterol: catalog.cholesterol_text(categories.cholesterol).to_string(),
                glucose: catalog.glucose_text(categories.glucose).to_string(),
            },
        };

        tracing::info!(risk = %prediction.risk_category, "Prediction complete");
        Ok(prediction)
    }

    /// Score a payload and shape the result for the wire.
    ///
    /// # Errors
    /// See [`PredictionService::predict`].
    pub fn respond(&self, payload: &Value) -> Result<PredictionResponse, CardioriskError> {
        Ok(self.predict(payload)?.to_response())
    }
}
