//! TCP transport implementation.
//!
//! Line-delimited JSON-RPC over TCP. Each accepted connection gets its own
//! MCP session; all sessions share the server's store handle.

use rmcp::ServiceExt;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// Delay before accepting again after a failed accept.
const ACCEPT_BACKOFF_MS: u64 = 100;

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Accept connections until the process is stopped.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("Accepted connection from {}", peer_addr);

                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                    }

                    tokio::spawn(Self::serve_connection(server.clone(), stream, peer_addr));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(ACCEPT_BACKOFF_MS))
                        .await;
                }
            }
        }
    }

    async fn serve_connection(server: McpServer, stream: TcpStream, peer_addr: SocketAddr) {
        let service = match server.serve(stream).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to initialize session for {}: {}", peer_addr, e);
                return;
            }
        };

        match service.waiting().await {
            Ok(reason) => info!("Client {} disconnected: {:?}", peer_addr, reason),
            Err(e) => warn!("Error while serving client {}: {}", peer_addr, e),
        }
    }
}
