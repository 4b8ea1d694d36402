//! Artifact adapter: loads the exported scaler and model from disk.
//!
//! An artifact directory contains `scaler.json` and `model.json`, optionally
//! bound by a signed `manifest.json` + `artifacts.sig`. Everything is checked
//! once here so that a mismatched export fails at startup rather than on the
//! first request.

mod manifest;
mod model;
mod scaler;

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;

use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{FeatureScaler, RiskModel};

pub use manifest::{
    sha256_hex, verify_manifest, verifying_key_from_b64, ArtifactManifest, MANIFEST_FILE,
    SIGNATURE_FILE,
};
pub use model::{ExportedModel, LogisticRegression, Node, Tree, TreeEnsemble};
pub use scaler::StandardScaler;

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";

/// Errors raised while loading or verifying artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact JSON ({0})")]
    Format(String),

    #[error("Invalid artifact: {0}")]
    Invalid(String),

    #[error("{artifact} expects {got} features, pipeline produces {expected}")]
    DimensionMismatch {
        artifact: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{artifact} column {position} is {found:?}, expected {expected:?}")]
    FeatureOrder {
        artifact: &'static str,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Artifact integrity check failed: {0}")]
    Signature(String),

    #[error("Unsigned artifacts refused (signed artifacts are required)")]
    UnsignedRejected,
}

/// How strictly artifact integrity is enforced.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPolicy {
    pub require_signed: bool,
    pub verifying_key: Option<VerifyingKey>,
}

/// A validated scaler/model pair.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub scaler: StandardScaler,
    pub model: ExportedModel,
    /// Whether the pair was bound by a verified manifest.
    pub signed: bool,
}

/// Load and cross-check `scaler.json` and `model.json` from `dir`.
///
/// # Errors
/// Returns `ArtifactError` on I/O, format, integrity or shape problems.
pub fn load_artifacts(dir: &Path, policy: &ArtifactPolicy) -> Result<Artifacts, ArtifactError> {
    let manifest = verify_manifest(dir, policy.verifying_key.as_ref())?;
    if manifest.is_none() {
        if policy.require_signed {
            tracing::error!("No signed manifest found in {:?}", dir);
            return Err(ArtifactError::UnsignedRejected);
        }
        tracing::warn!("Loading UNSIGNED artifacts from {:?}", dir);
    }

    // Hash the same bytes that get parsed.
    let scaler_bytes = read_file(&dir.join(SCALER_FILE))?;
    let model_bytes = read_file(&dir.join(MODEL_FILE))?;
    if let Some(manifest) = &manifest {
        manifest.check_binding(SCALER_FILE, &scaler_bytes)?;
        manifest.check_binding(MODEL_FILE, &model_bytes)?;
    }

    let scaler = StandardScaler::from_json_slice(&scaler_bytes)?;
    let model = ExportedModel::from_json_slice(&model_bytes)?;

    check_shape("scaler", scaler.n_features(), scaler.feature_names())?;
    check_shape("model", model.n_features(), model.feature_names())?;

    tracing::info!(
        model = model.kind(),
        signed = manifest.is_some(),
        "Artifacts loaded from {:?}",
        dir
    );

    Ok(Artifacts {
        scaler,
        model,
        signed: manifest.is_some(),
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_shape(
    artifact: &'static str,
    width: usize,
    names: &[String],
) -> Result<(), ArtifactError> {
    if width != FEATURE_COUNT {
        return Err(ArtifactError::DimensionMismatch {
            artifact,
            expected: FEATURE_COUNT,
            got: width,
        });
    }

    if let Some((position, (found, expected))) = names
        .iter()
        .zip(FEATURE_NAMES)
        .enumerate()
        .find(|(_, (found, expected))| found.as_str() != *expected)
    {
        return Err(ArtifactError::FeatureOrder {
            artifact,
            position,
            expected: expected.to_string(),
            found: found.clone(),
        });
    }
    Ok(())
}
