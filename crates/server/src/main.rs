//! Schedule Predictor - course auto-fill prediction service
//!
//! Loads every scenario artifact once at startup and serves ranked
//! predictions over HTTP. A missing artifact is a fatal startup error;
//! the service never answers requests with a stale or default model.

use anyhow::{Context, Result};
use predictor_lib::InferenceService;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SERVER_VERSION, "Starting schedule-predictor");

    let config = config::ServerConfig::load()?;
    info!(artifacts_dir = %config.artifacts_dir, "Server configured");

    let service = InferenceService::load(Path::new(&config.artifacts_dir))
        .context("failed to load model artifacts; run training first")?;

    let app_state = Arc::new(api::AppState::new(service));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
