//! TED Engine Binary
//!
//! Fetches the Thailand national-accounts series, runs the
//! decomposition once, and serves the result.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ted-engine
//! ```
//!
//! # Environment Variables
//!
//! - `TED_ENGINE_CONFIG`: Config file path (default: config.yaml;
//!   missing file falls back to built-in defaults)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use ted_engine::config::{Config, ConfigError, load_config};
use ted_engine::decomposition::{DecompositionEngine, DecompositionSettings};
use ted_engine::series::catalog::expenditure_tree;
use ted_engine::server::{AppState, create_router};
use ted_engine::source::{TedClient, load_raw_bundle};
use ted_engine::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let config = resolve_config()?;
    let tree = expenditure_tree().context("building series tree")?;

    let client = TedClient::new(&config.source.base_url, config.source.timeout())
        .context("creating TED client")?;
    info!(
        base_url = %config.source.base_url,
        start_year = config.accounts.start_year,
        "loading raw series"
    );
    let bundle = load_raw_bundle(&client, &tree, config.accounts.start_year)
        .await
        .context("loading raw series")?;

    let engine = DecompositionEngine::new(
        tree.clone(),
        DecompositionSettings {
            base_year: config.accounts.base_year,
            aggregate: config.accounts.aggregate.clone(),
        },
    );
    let result = engine.decompose(&bundle).context("decomposing series")?;
    info!(
        nodes = tree.nodes().len(),
        years = bundle.yearly.periods.len(),
        "decomposition complete"
    );

    let state = AppState::new(Arc::new(tree), Arc::new(result));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.http_port)
        .parse()
        .context("parsing bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("shutdown complete");
    Ok(())
}

/// Load config from `TED_ENGINE_CONFIG` or `config.yaml`, falling back
/// to built-in defaults when no file exists. A file that exists but is
/// malformed is still an error.
fn resolve_config() -> anyhow::Result<Config> {
    let path = std::env::var("TED_ENGINE_CONFIG").ok();
    match load_config(path.as_deref()) {
        Ok(config) => Ok(config),
        Err(ConfigError::ReadError { path, source })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            info!(%path, "no config file, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("loading config"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
