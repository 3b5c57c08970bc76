//! # Scorelink
//!
//! Keeps one authenticated websocket session to the scoring service alive.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Snapshot store, proxy list and session manager
//! - Optional HTTP status server

use anyhow::Result;
use tracing::info;

use scorelink::config::Settings;
use scorelink::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    scorelink::telemetry::init_tracing();

    info!("Starting Scorelink...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        endpoint = %settings.session.endpoint,
        profile = %settings.session.profile,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    application.run_until_stopped().await?;

    info!("Stopped");
    Ok(())
}
