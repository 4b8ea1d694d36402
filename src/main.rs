//! Cardiorisk: cardiovascular risk prediction service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};

use cardiorisk::adapters::http;
use cardiorisk::config::ServiceConfig;
use cardiorisk::logging::{self, LogTarget};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    let _guard = logging::init(LogTarget::for_mode(config.log_mode, &config.log_file))
        .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;

    tracing::info!("Starting Cardiorisk...");

    let service = cardiorisk::load_service(&config).with_context(|| {
        format!(
            "Failed to load prediction artifacts from {:?}",
            config.artifact_dir
        )
    })?;

    let router = http::create_router(Arc::new(service));
    http::serve(config.addr, router).await?;

    tracing::info!("Cardiorisk shutdown complete.");
    Ok(())
}
