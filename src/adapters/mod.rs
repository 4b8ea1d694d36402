//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `artifacts`: JSON scaler/model exports and their signed manifest
//! - `http`: axum routes for the prediction service
//! - `sanitize`: measurement and secret filtering for logs

pub mod artifacts;
pub mod http;
pub mod sanitize;

pub use artifacts::{load_artifacts, ArtifactError, ArtifactPolicy, Artifacts};
