//! Service configuration read from `CARDIORISK_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use ed25519_dalek::VerifyingKey;

use crate::adapters::artifacts::{verifying_key_from_b64, ArtifactPolicy};

pub const ADDR_ENV: &str = "CARDIORISK_ADDR";
pub const ARTIFACT_DIR_ENV: &str = "CARDIORISK_ARTIFACT_DIR";
pub const REQUIRE_SIGNED_ENV: &str = "CARDIORISK_REQUIRE_SIGNED_ARTIFACTS";
pub const PUBKEY_B64_ENV: &str = "CARDIORISK_ARTIFACT_PUBKEY_B64";
pub const PUBKEY_FILE_ENV: &str = "CARDIORISK_ARTIFACT_PUBKEY_B64_FILE";
pub const CATALOG_ENV: &str = "CARDIORISK_MESSAGE_CATALOG";
pub const LOG_MODE_ENV: &str = "CARDIORISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIORISK_LOG_FILE";

const DEFAULT_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_ARTIFACT_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "cardiorisk.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed reading {var} file {path:?}: {source}")]
    Io {
        var: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where server logs go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub artifact_dir: PathBuf,
    pub require_signed: bool,
    pub verifying_key: Option<VerifyingKey>,
    pub catalog_path: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup` (name -> value).
    ///
    /// # Errors
    /// Returns `ConfigError` for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let addr_raw = get(ADDR_ENV).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: ADDR_ENV,
                value: addr_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let require_signed = match get(REQUIRE_SIGNED_ENV) {
            Some(v) => parse_bool(REQUIRE_SIGNED_ENV, &v)?,
            None => false,
        };

        // The inline key wins over the file.
        let verifying_key = match (get(PUBKEY_B64_ENV), get(PUBKEY_FILE_ENV)) {
            (Some(b64), _) => Some(parse_key(PUBKEY_B64_ENV, &b64)?),
            (None, Some(path)) => {
                let b64 = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    var: PUBKEY_FILE_ENV,
                    path: PathBuf::from(&path),
                    source,
                })?;
                Some(parse_key(PUBKEY_FILE_ENV, &b64)?)
            }
            (None, None) => None,
        };

        let log_mode = match get(LOG_MODE_ENV).as_deref() {
            None | Some("stdout") => LogMode::Stdout,
            Some("file") => LogMode::File,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_MODE_ENV,
                    value: other.to_string(),
                    reason: "expected `stdout` or `file`".into(),
                })
            }
        };

        Ok(Self {
            addr,
            artifact_dir: PathBuf::from(
                get(ARTIFACT_DIR_ENV).unwrap_or_else(|| DEFAULT_ARTIFACT_DIR.to_string()),
            ),
            require_signed,
            verifying_key,
            catalog_path: get(CATALOG_ENV).map(PathBuf::from),
            log_mode,
            log_file: PathBuf::from(
                get(LOG_FILE_ENV).unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            ),
        })
    }

    #[must_use]
    pub fn artifact_policy(&self) -> ArtifactPolicy {
        ArtifactPolicy {
            require_signed: self.require_signed,
            verifying_key: self.verifying_key,
        }
    }
}

/// Accepts `1/true/TRUE/yes/YES` and `0/false/FALSE/no/NO`.
fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

fn parse_key(var: &'static str, b64: &str) -> Result<VerifyingKey, ConfigError> {
    verifying_key_from_b64(b64).map_err(|e| ConfigError::Invalid {
        var,
        value: b64.trim().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use ed25519_dalek::SigningKey;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).expect("Defaults should parse");
        assert_eq!(cfg.addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.artifact_dir, PathBuf::from("models"));
        assert!(!cfg.require_signed);
        assert!(cfg.verifying_key.is_none());
        assert!(cfg.catalog_path.is_none());
        assert_eq!(cfg.log_mode, LogMode::Stdout);
        assert_eq!(cfg.log_file, PathBuf::from("cardiorisk.log"));
    }

    #[test]
    fn test_overrides() {
        let key = SigningKey::from_bytes(&[3u8; 32]).verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        let cfg = config(&[
            (ADDR_ENV, "0.0.0.0:8080"),
            (ARTIFACT_DIR_ENV, "/srv/artifacts"),
            (REQUIRE_SIGNED_ENV, "yes"),
            (PUBKEY_B64_ENV, b64.as_str()),
            (CATALOG_ENV, "/etc/cardiorisk/en.json"),
            (LOG_MODE_ENV, "file"),
            (LOG_FILE_ENV, "/var/log/cardiorisk.log"),
        ])
        .expect("Should parse");

        assert_eq!(cfg.addr.port(), 8080);
        assert_eq!(cfg.artifact_dir, PathBuf::from("/srv/artifacts"));
        assert!(cfg.require_signed);
        assert_eq!(cfg.verifying_key, Some(key));
        assert_eq!(
            cfg.catalog_path,
            Some(PathBuf::from("/etc/cardiorisk/en.json"))
        );
        assert_eq!(cfg.log_mode, LogMode::File);

        let policy = cfg.artifact_policy();
        assert!(policy.require_signed);
        assert_eq!(policy.verifying_key, Some(key));
    }

    #[test]
    fn test_pubkey_file() {
        let key = SigningKey::from_bytes(&[8u8; 32]).verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pub.b64");
        std::fs::write(&path, format!("{b64}\n")).unwrap();

        let cfg = config(&[(PUBKEY_FILE_ENV, path.to_str().unwrap())]).unwrap();
        assert_eq!(cfg.verifying_key, Some(key));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[(ADDR_ENV, "not an address")]).is_err());
        assert!(config(&[(REQUIRE_SIGNED_ENV, "maybe")]).is_err());
        assert!(config(&[(LOG_MODE_ENV, "syslog")]).is_err());
        assert!(config(&[(PUBKEY_B64_ENV, "AAAA")]).is_err());
        assert!(matches!(
            config(&[(PUBKEY_FILE_ENV, "/nonexistent/cardiorisk.pub")]),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_parse_bool() {
        for v in ["1", "true", "TRUE", "yes", "YES"] {
            assert!(parse_bool(REQUIRE_SIGNED_ENV, v).unwrap());
        }
        for v in ["0", "false", "no"] {
            assert!(!parse_bool(REQUIRE_SIGNED_ENV, v).unwrap());
        }
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let cfg = config(&[(ARTIFACT_DIR_ENV, "  "), (LOG_MODE_ENV, "")]).unwrap();
        assert_eq!(cfg.artifact_dir, PathBuf::from("models"));
        assert_eq!(cfg.log_mode, LogMode::Stdout);
    }
}
