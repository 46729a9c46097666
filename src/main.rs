//! Contacts Service
//!
//! An HTTP server holding an in-memory contact list.
//! GET /contacts lists it, POST /contacts appends to it.

use anyhow::Context;
use contacts_service::{build_app, config::Config};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded: {:?}", config);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let app = Arc::new(build_app(&config.server).context("Failed to seed contact store")?);

    app.run(&config.server_addr())
        .await
        .context("Server terminated abnormally")?;

    Ok(())
}
