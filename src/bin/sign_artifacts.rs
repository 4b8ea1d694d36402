//! Artifact signing utility.
//!
//! Writes `manifest.json` (SHA-256 of `model.json` and `scaler.json`) and the
//! Ed25519 signature `artifacts.sig` into an artifact directory, so the
//! server can refuse tampered exports.
//!
//! # Usage
//!
//! ```bash
//! sign_artifacts --generate-key <seed_path>   # new 0600 seed, prints public key
//! sign_artifacts <artifact_dir>               # sign with an existing seed
//! ```
//!
//! The base64 seed is read from the file named by
//! `CARDIORISK_SIGNING_KEY_B64_FILE`, or (debug builds only) from
//! `CARDIORISK_SIGNING_KEY_B64`. Seed bytes are zeroized after use.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cardiorisk::adapters::artifacts::{ArtifactManifest, MODEL_FILE, SCALER_FILE};

const KEY_FILE_ENV: &str = "CARDIORISK_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "CARDIORISK_SIGNING_KEY_B64";

const USAGE: &str = "Usage: sign_artifacts <artifact_dir> | sign_artifacts --generate-key <seed_path>";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

enum Command {
    Sign(PathBuf),
    GenerateKey(PathBuf),
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [flag, path] if flag == "--generate-key" => Ok(Command::GenerateKey(PathBuf::from(path))),
        [dir] if !dir.starts_with('-') => Ok(Command::Sign(PathBuf::from(dir))),
        _ => bail!(USAGE),
    }
}

fn read_seed_b64() -> Result<Zeroizing<String>> {
    let raw = if let Ok(path) = env::var(KEY_FILE_ENV) {
        Zeroizing::new(
            fs::read_to_string(path.trim())
                .with_context(|| format!("Failed reading signing key file {path:?}"))?,
        )
    } else if cfg!(debug_assertions) {
        match env::var(KEY_ENV) {
            Ok(v) => Zeroizing::new(v),
            Err(_) => bail!("Missing signing key. Set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds)."),
        }
    } else {
        bail!("Missing signing key. Set {KEY_FILE_ENV}.");
    };

    let secret = Zeroizing::new(raw.trim().to_string());
    if secret.is_empty() {
        bail!("Empty signing key");
    }
    Ok(secret)
}

fn read_seed() -> Result<Seed> {
    let b64 = read_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.as_bytes())
            .context("Invalid base64 in signing key")?,
    );
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn generate_key(path: &Path) -> Result<()> {
    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);
    let signing_key = SigningKey::from_bytes(&seed.0);
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create {path:?} (refusing to overwrite)"))?;
    file.write_all(seed_b64.as_bytes())?;
    file.write_all(b"\n")?;

    println!("Wrote signing seed: {path:?}");
    println!(
        "CARDIORISK_ARTIFACT_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().to_bytes())
    );
    Ok(())
}

fn sign(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("{dir:?} is not a directory");
    }

    let seed = read_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let manifest = ArtifactManifest::for_files(dir, &[MODEL_FILE, SCALER_FILE])?;
    manifest.write_signed(dir, &signing_key)?;

    for (name, hash) in &manifest.files {
        println!("{name}: sha256={hash}");
    }
    println!(
        "Signed {:?} with public key {}",
        dir,
        general_purpose::STANDARD.encode(signing_key.verifying_key().to_bytes())
    );
    Ok(())
}

fn main() -> Result<()> {
    match parse_args()? {
        Command::GenerateKey(path) => generate_key(&path),
        Command::Sign(dir) => sign(&dir),
    }
}
