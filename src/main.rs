//! chash Service - Main Entry Point
//!
//! Serves named consistent-hashing rings over HTTP.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chash::api::{self, AppState};
use chash::persist;
use chash::registry::Registry;
use chash::types::ServiceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "chash=info,tower_http=debug".into()),
    );
    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting chash service v{}", env!("CARGO_PKG_VERSION"));
    info!("Default replicas: {}", config.default_replicas);

    // Initialize registry
    let registry = Arc::new(Registry::new());
    if let Some(path) = &config.snapshot_path {
        persist::load_snapshot(&registry, path)?;
    }

    let port = config.port;
    let snapshot_path = config.snapshot_path.clone();
    let state = Arc::new(AppState {
        registry: Arc::clone(&registry),
        config,
    });
    let app = api::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &snapshot_path {
        persist::save_snapshot(&registry, path)?;
    }
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
