//! Signed artifact manifest.
//!
//! `manifest.json` lists the SHA-256 of every bound artifact and
//! `artifacts.sig` holds a raw 64-byte Ed25519 signature over the manifest
//! bytes exactly as written.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ArtifactError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,

    /// Unix timestamp (seconds) when the manifest was signed.
    #[serde(default)]
    pub created_at: Option<i64>,

    /// File name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash the named files inside `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if a file cannot be read.
    pub fn for_files(dir: &Path, names: &[&str]) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in names {
            let path = dir.join(name);
            let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }

        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: Some(unix_now()),
            files,
        })
    }

    /// Serialize, sign, and write `manifest.json` + `artifacts.sig` into `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if serialization or writing fails.
    pub fn write_signed(&self, dir: &Path, signing_key: &SigningKey) -> Result<(), ArtifactError> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| ArtifactError::Format(format!("manifest: {e}")))?;

        let manifest_path = dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, &bytes).map_err(|source| ArtifactError::Io {
            path: manifest_path,
            source,
        })?;

        let signature: Signature = signing_key.sign(&bytes);
        let sig_path = dir.join(SIGNATURE_FILE);
        fs::write(&sig_path, signature.to_bytes()).map_err(|source| ArtifactError::Io {
            path: sig_path,
            source,
        })?;
        Ok(())
    }

    /// Check that `bytes` are the content bound under `name`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Signature` if the file is not bound or its hash
    /// differs.
    pub fn check_binding(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let expected = self
            .files
            .get(name)
            .ok_or_else(|| ArtifactError::Signature(format!("manifest does not bind {name}")))?;

        if !constant_time_eq_str(&sha256_hex(bytes), &expected.to_ascii_lowercase()) {
            return Err(ArtifactError::Signature(format!(
                "File hash mismatch for {name}"
            )));
        }
        Ok(())
    }
}

/// Read and verify the manifest in `dir`.
///
/// Returns `Ok(None)` when neither the manifest nor the signature exists.
///
/// # Errors
/// Returns `ArtifactError::Signature` when only one of the two files exists,
/// no verifying key is configured, or the signature does not verify.
pub fn verify_manifest(
    dir: &Path,
    verifying_key: Option<&VerifyingKey>,
) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let sig_path = dir.join(SIGNATURE_FILE);

    match (manifest_path.exists(), sig_path.exists()) {
        (false, false) => return Ok(None),
        (true, true) => {}
        _ => {
            return Err(ArtifactError::Signature(format!(
                "{MANIFEST_FILE} and {SIGNATURE_FILE} must be present together"
            )))
        }
    }

    let key = verifying_key.ok_or_else(|| {
        ArtifactError::Signature("Artifacts are signed but no verifying key is configured".into())
    })?;

    let sig_bytes = fs::read(&sig_path).map_err(|source| ArtifactError::Io {
        path: sig_path.clone(),
        source,
    })?;
    let sig_array: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Signature("Invalid signature length (expected 64 bytes)".into())
    })?;
    let signature = Signature::from_bytes(&sig_array);

    let manifest_bytes = fs::read(&manifest_path).map_err(|source| ArtifactError::Io {
        path: manifest_path.clone(),
        source,
    })?;

    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ArtifactError::Signature("Invalid artifact signature".into()))?;

    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ArtifactError::Format(format!("manifest: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Signature(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    if manifest.files.is_empty() {
        return Err(ArtifactError::Signature(
            "manifest.json contains no files".into(),
        ));
    }

    Ok(Some(manifest))
}

/// Decode a base64 Ed25519 public key.
///
/// # Errors
/// Returns `ArtifactError::Signature` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Signature("Invalid public key base64".into()))?;
    let pubkey: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Signature("Invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&pubkey)
        .map_err(|_| ArtifactError::Signature("Invalid verifying key".into()))
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

// Constant-time compare for ASCII hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn signing_key(byte: u8) -> SigningKey {
        SigningKey::from_bytes(&[byte; 32])
    }

    fn write_files(dir: &Path) {
        fs::write(dir.join("model.json"), b"{\"m\":1}").unwrap();
        fs::write(dir.join("scaler.json"), b"{\"s\":2}").unwrap();
    }

    #[test]
    fn test_unsigned_directory_yields_none() {
        let temp = tempdir().unwrap();
        write_files(temp.path());
        let result = verify_manifest(temp.path(), None).expect("Should not fail");
        assert!(result.is_none());
    }

    #[test]
    fn test_sign_and_verify() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        write_files(dir);

        let key = signing_key(7);
        let manifest = ArtifactManifest::for_files(dir, &["model.json", "scaler.json"]).unwrap();
        manifest.write_signed(dir, &key).unwrap();

        let verified = verify_manifest(dir, Some(&key.verifying_key()))
            .expect("Should verify")
            .expect("Should be signed");
        assert_eq!(verified, manifest);
        verified
            .check_binding("model.json", &fs::read(dir.join("model.json")).unwrap())
            .expect("Should bind model");
        assert!(verified.check_binding("model.json", b"tampered").is_err());
        assert!(verified.check_binding("other.json", b"").is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        write_files(dir);

        ArtifactManifest::for_files(dir, &["model.json"])
            .unwrap()
            .write_signed(dir, &signing_key(1))
            .unwrap();

        let other = signing_key(2).verifying_key();
        assert!(matches!(
            verify_manifest(dir, Some(&other)),
            Err(ArtifactError::Signature(_))
        ));
    }

    #[test]
    fn test_signed_without_key_rejected() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        write_files(dir);
        ArtifactManifest::for_files(dir, &["model.json"])
            .unwrap()
            .write_signed(dir, &signing_key(3))
            .unwrap();

        assert!(verify_manifest(dir, None).is_err());
    }

    #[test]
    fn test_tampered_manifest_rejected() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        write_files(dir);
        let key = signing_key(4);
        ArtifactManifest::for_files(dir, &["model.json"])
            .unwrap()
            .write_signed(dir, &key)
            .unwrap();

        let mut bytes = fs::read(dir.join(MANIFEST_FILE)).unwrap();
        bytes.push(b' ');
        fs::write(dir.join(MANIFEST_FILE), bytes).unwrap();

        assert!(verify_manifest(dir, Some(&key.verifying_key())).is_err());
    }

    #[test]
    fn test_missing_signature_file_rejected() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        write_files(dir);
        fs::write(dir.join(MANIFEST_FILE), b"{}").unwrap();

        assert!(verify_manifest(dir, None).is_err());
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key(9).verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        assert_eq!(verifying_key_from_b64(&format!("{b64}\n")).unwrap(), key);
        assert!(verifying_key_from_b64("not base64!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq_str("abc", "abc"));
        assert!(!constant_time_eq_str("abc", "abd"));
        assert!(!constant_time_eq_str("abc", "ab"));
    }
}
