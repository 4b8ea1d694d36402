//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the prediction pipeline and the serialized scaler/model it consumes.

mod scoring;

pub use scoring::{FeatureScaler, RiskModel, ScoringError};
