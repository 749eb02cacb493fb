//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating tool listing and tool calls to the
//! [`ToolRegistry`].
//!
//! The document store is constructed by the caller and injected, so the
//! server itself holds no global state and can be driven against any
//! [`DocumentStore`] implementation.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::tools::ToolRegistry;
use crate::store::DocumentStore;

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool catalog and dispatcher.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server backed by `store`.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ToolRegistry::new(store)),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn instructions(&self) -> String {
        format!(
            "Tools for reading and writing items in the Cosmos DB database '{}'. \
             Every tool except list_containers takes a containerName; the default \
             container is '{}'.",
            self.config.cosmos.database, self.config.cosmos.default_container
        )
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: ToolRegistry::get_all_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .registry
            .call_tool(&request.name, request.arguments)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, MemoryStore, SqlQuery, StoreResult};
    use async_trait::async_trait;
    use rmcp::ServiceExt;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{
        AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
    };

    fn test_server() -> McpServer {
        McpServer::new(Config::default(), Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_server_info() {
        let server = test_server();
        let info = server.get_info();

        assert!(info.capabilities.tools.is_some());
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("'todos'"));
        assert!(instructions.contains("'tasks'"));
    }

    #[test]
    fn test_server_identity() {
        let server = test_server();
        assert_eq!(server.name(), "cosmosdb-mcp-server");
        assert_eq!(server.version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(server.config().cosmos.database, "todos");
    }

    #[tokio::test]
    async fn test_registry_shared_between_clones() {
        let server = test_server();
        let clone = server.clone();
        assert!(std::ptr::eq(server.registry(), clone.registry()));

        let result = clone.registry().call_tool("nope", None).await;
        assert_eq!(result.is_error, Some(true));
    }

    /// Line-delimited JSON-RPC client talking to a server over an in-memory pipe.
    struct Client {
        lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl Client {
        async fn connect(server: McpServer) -> Self {
            let (client_io, server_io) = tokio::io::duplex(64 * 1024);
            tokio::spawn(async move {
                if let Ok(service) = server.serve(server_io).await {
                    let _ = service.waiting().await;
                }
            });

            let (reader, writer) = tokio::io::split(client_io);
            let mut client = Self {
                lines: BufReader::new(reader).lines(),
                writer,
            };

            client
                .send(json!({
                    "jsonrpc": "2.0",
                    "id": 0,
                    "method": "initialize",
                    "params": {
                        "protocolVersion": "2024-11-05",
                        "capabilities": {},
                        "clientInfo": { "name": "test", "version": "0" }
                    }
                }))
                .await;
            let init = client.recv().await;
            assert_eq!(init["id"], 0);
            assert!(init["result"]["capabilities"]["tools"].is_object());

            client
                .send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
                .await;
            client
        }

        async fn send(&mut self, message: Value) {
            let line = format!("{message}\n");
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.flush().await.unwrap();
        }

        /// Next message carrying an id; notifications are skipped.
        async fn recv(&mut self) -> Value {
            loop {
                let line = self.lines.next_line().await.unwrap().unwrap();
                let message: Value = serde_json::from_str(&line).unwrap();
                if message.get("id").is_some() {
                    return message;
                }
            }
        }

        async fn call(&mut self, id: u64, name: &str, arguments: Value) {
            self.send(json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            }))
            .await;
        }
    }

    #[tokio::test]
    async fn test_tools_list_over_the_wire() {
        let mut client = Client::connect(test_server()).await;
        client
            .send(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {} }))
            .await;

        let response = client.recv().await;
        assert_eq!(response["id"], 1);
        let names: Vec<_> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ToolRegistry::tool_names());
    }

    #[tokio::test]
    async fn test_call_tool_envelope_over_the_wire() {
        let store = MemoryStore::default();
        store.insert("tasks", json!({ "id": "t1", "title": "write tests" }));
        let server = McpServer::new(Config::default(), Arc::new(store));
        let mut client = Client::connect(server).await;

        client
            .call(1, "get_item", json!({ "containerName": "tasks", "id": "t1" }))
            .await;
        let response = client.recv().await;
        assert_eq!(response["id"], 1);
        let result = &response["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        let body: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["item"]["title"], "write tests");

        client.call(2, "drop_database", json!({})).await;
        let response = client.recv().await;
        assert_eq!(response["id"], 2);
        let result = &response["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "Unknown tool: drop_database");
    }

    /// Store whose reads take a while and record how many overlap.
    #[derive(Default)]
    struct SlowStore {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for SlowStore {
        fn database(&self) -> &str {
            "todos"
        }

        async fn read_item(&self, _: &str, id: &str, _: &str) -> StoreResult<Option<Document>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(json!({ "id": id }).as_object().cloned())
        }

        async fn upsert_item(&self, _: &str, _: Document, _: Option<&str>) -> StoreResult<Document> {
            unimplemented!()
        }

        async fn replace_item(&self, _: &str, _: &str, _: &str, _: Document) -> StoreResult<Document> {
            unimplemented!()
        }

        async fn query_items(&self, _: &str, _: &SqlQuery) -> StoreResult<Vec<Document>> {
            unimplemented!()
        }

        async fn list_containers(&self) -> StoreResult<Vec<String>> {
            unimplemented!()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pipelined_calls_do_not_overlap() {
        let store = Arc::new(SlowStore::default());
        let server = McpServer::new(Config::default(), store.clone());
        let mut client = Client::connect(server).await;

        client.call(1, "get_item", json!({ "containerName": "c", "id": "a" })).await;
        client.call(2, "get_item", json!({ "containerName": "c", "id": "b" })).await;

        let mut results = HashMap::new();
        for _ in 0..2 {
            let response = client.recv().await;
            results.insert(response["id"].as_u64().unwrap(), response);
        }

        for (id, item) in [(1u64, "a"), (2, "b")] {
            let text = results[&id]["result"]["content"][0]["text"].as_str().unwrap();
            let body: Value = serde_json::from_str(text).unwrap();
            assert_eq!(body["item"]["id"], item);
        }
        assert_eq!(store.peak.load(Ordering::SeqCst), 1);
    }
}
