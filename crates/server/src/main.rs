//! easycal-sw entry point.
//!
//! Boots the cache worker and serves its hooks as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use easycal_client::{FetchClient, FetchConfig, Worker};
use easycal_core::{AppConfig, CacheDb};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let worker_config = config.worker_config().context("resolving worker configuration")?;

    tracing::info!(
        "Starting easycal-sw for {} (cache {}) on stdio transport",
        config.origin,
        config.cache_version
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache at {}", config.db_path.display()))?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(Worker::new(worker_config, db, Arc::new(network)));

    // the host itself is a page, so it sees broadcasts too
    let (client, receiver) = worker.clients().connect(config.origin.clone()).await;

    match worker.register().await {
        Ok(state) => tracing::info!("worker registered: {}", state.as_str()),
        Err(e) => tracing::error!("worker registration failed: {}", e),
    }

    let handler = handler::WorkerServer::new(worker, tools::client_messages::Inbox::new(client.id, receiver));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
