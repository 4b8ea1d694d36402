//! # Cardiorisk
//!
//! Cardiovascular risk prediction service.
//!
//! This crate provides:
//! - Coercion of loosely typed patient measurements
//! - Clinical categorization (blood pressure, BMI, cholesterol, glucose)
//! - Scoring with an exported scaler and model
//! - Risk labels and per-category recommendations from a message catalog
//! - An HTTP route, a one-shot CLI and an artifact signing tool
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patient input, categories, risk, catalog)
//! - `ports`: Trait definitions for the scaler and model
//! - `adapters`: Concrete implementations (JSON artifacts, axum, log sanitizer)
//! - `application`: The prediction use case orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;

pub use domain::{PatientInput, Prediction, PredictionResponse, RiskCategory};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] domain::InputError),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ports::ScoringError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] adapters::artifacts::ArtifactError),

    #[error("Message catalog error: {0}")]
    Catalog(#[from] domain::CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CardioriskError {
    /// Whether the caller sent something wrong (as opposed to a server fault).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Prediction service backed by the JSON artifact exports.
pub type ArtifactPredictionService = application::PredictionService<
    adapters::artifacts::StandardScaler,
    adapters::artifacts::ExportedModel,
>;

/// Load artifacts and the message catalog named by `config`.
///
/// # Errors
/// Returns an error if the artifacts or the catalog override fail to load.
pub fn load_service(config: &config::ServiceConfig) -> Result<ArtifactPredictionService> {
    let artifacts = adapters::load_artifacts(&config.artifact_dir, &config.artifact_policy())?;

    let catalog = match &config.catalog_path {
        Some(path) => domain::MessageCatalog::from_json_file(path)?,
        None => domain::MessageCatalog::portuguese(),
    };

    Ok(application::PredictionService::new(
        std::sync::Arc::new(artifacts.scaler),
        std::sync::Arc::new(artifacts.model),
        std::sync::Arc::new(catalog),
    ))
}
