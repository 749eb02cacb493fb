//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, connects the Cosmos DB client
//! and serves MCP requests over the configured transport. Any startup
//! failure exits with a non-zero status.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use cosmosdb_mcp_server::core::{Config, McpServer, TransportService};
use cosmosdb_mcp_server::store::CosmosStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);
    config.log_summary();

    config.validate()?;

    let store = CosmosStore::from_config(&config.cosmos)
        .context("Failed to create Cosmos DB client")?;

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config, Arc::new(store));

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the protocol.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
