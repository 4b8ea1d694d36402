//! Risk classification and prediction results.

use serde::{Deserialize, Serialize};

use super::features::CategoryCodes;

/// Ordinal risk bucket derived from the model probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskCategory {
    /// Bucket a probability. Lower bounds are inclusive:
    /// `[0, 0.1) [0.1, 0.3) [0.3, 0.5) [0.5, 0.7) [0.7, 1]`.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.1 {
            Self::VeryLow
        } else if probability < 0.3 {
            Self::Low
        } else if probability < 0.5 {
            Self::Moderate
        } else if probability < 0.7 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryLow => write!(f, "VERY_LOW"),
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
            Self::VeryHigh => write!(f, "VERY_HIGH"),
        }
    }
}

/// Advisory texts for the four clinical categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub blood_pressure: String,
    pub bmi: String,
    pub cholesterol: String,
    pub glucose: String,
}

/// Outcome of one prediction request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Probability of the positive class (0.0 to 1.0)
    pub probability: f64,

    pub risk_category: RiskCategory,

    /// Catalog label for `risk_category`
    pub risk_label: String,

    pub categories: CategoryCodes,

    pub recommendations: Recommendations,
}

impl Prediction {
    /// Probability as a percentage with two decimals, e.g. `"42.13%"`.
    #[must_use]
    pub fn probability_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }

    #[must_use]
    pub fn to_response(&self) -> PredictionResponse {
        PredictionResponse {
            probability: self.probability_percent(),
            risk_category: self.risk_label.clone(),
            bp_recommendation: self.recommendations.blood_pressure.clone(),
            bmi_recommendation: self.recommendations.bmi.clone(),
            chol_recommendation: self.recommendations.cholesterol.clone(),
            gluc_recommendation: self.recommendations.glucose.clone(),
        }
    }
}

/// Wire format returned by the HTTP route and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub probability: String,
    pub risk_category: String,
    pub bp_recommendation: String,
    pub bmi_recommendation: String,
    pub chol_recommendation: String,
    pub gluc_recommendation: String,
}
