//! # taxfile-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the tax filing service.

use clap::Parser;
use taxfile_api::state::{AppConfig, AppState, LogFormat};
use taxfile_store::DocumentStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::parse();

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::debug!(?config, "loaded configuration");

    // Database pool is optional; absent means in-memory only.
    let pool = taxfile_store::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;
    let store = DocumentStore::new(pool);

    let loaded = store.hydrate().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;
    if store.pool().is_some() {
        tracing::info!(documents = loaded, "hydrated document store");
    }

    let port = config.port;
    let app = taxfile_api::app(AppState::with_config(config, store));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("taxfile API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
