//! Cosmos DB MCP Server Library
//!
//! This crate exposes an Azure Cosmos DB database to MCP clients through a
//! small set of tools: point reads, upserts, merge-updates, SQL queries,
//! container listing and sampling.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool catalog, dispatcher and tool implementations
//! - **store**: the [`store::DocumentStore`] seam and its Cosmos DB client
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cosmosdb_mcp_server::{Config, McpServer, store::CosmosStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let store = CosmosStore::from_config(&config.cosmos)?;
//!     let server = McpServer::new(config, Arc::new(store));
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;
pub mod store;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
