mod config;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use labelwise_ai::{ArtifactLoader, InferenceEngine};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        project = %settings.project_name,
        "application starting up"
    );

    let engine = Arc::new(InferenceEngine::new(ArtifactLoader::new(
        settings.artifact_path(),
    )));
    if settings.preload {
        match engine.ensure_loaded().await {
            Ok(bundle) => info!(labels = bundle.labels().len(), "model preloaded"),
            Err(e) => warn!(error = %e, "preload failed, will retry on first request"),
        }
    }

    let prefix = settings.route_prefix();
    let app = routes::router(
        AppState::new(engine, settings.project_name.as_str()),
        &prefix,
    );

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;
    info!(addr = %settings.bind, prefix = %prefix, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("application shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
