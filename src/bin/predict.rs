//! One-shot prediction CLI.
//!
//! # Usage
//!
//! ```bash
//! predict '{"age_years": 50, "gender": "male", ...}'
//! ```
//!
//! Prints the prediction as JSON on stdout. Logs go to stderr. Artifacts and
//! the catalog override are located through the same `CARDIORISK_*`
//! variables as the server.

use anyhow::{Context, Result};

use cardiorisk::config::ServiceConfig;
use cardiorisk::logging::{self, LogTarget};

fn main() -> Result<()> {
    let Some(raw) = std::env::args().nth(1) else {
        println!("No input provided. Please provide input data as a JSON string.");
        return Ok(());
    };

    let _guard = logging::init(LogTarget::Stderr)?;

    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("Input is not valid JSON")?;

    let config = ServiceConfig::from_env().context("Invalid configuration")?;
    let service = cardiorisk::load_service(&config).with_context(|| {
        format!(
            "Failed to load prediction artifacts from {:?}",
            config.artifact_dir
        )
    })?;

    let response = service.respond(&payload)?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
