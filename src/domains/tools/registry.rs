//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - The ordered catalog of available tools
//! - Dispatch of tool calls by name
//!
//! Dispatch is the single top-level failure boundary: unknown tools, invalid
//! arguments and panicking handlers all become `isError` results here.
//!
//! The MCP service runs each incoming request on its own task, so the
//! registry serializes dispatch: one tool call runs to completion before the
//! next starts.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::definitions::{
    GetItemTool, ListContainersTool, PutItemTool, QueryContainerTool, SampleItemTool,
    UpdateItemTool,
};
use super::{OperationResult, ToolError};
use crate::store::DocumentStore;

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - owns the store handle and routes calls to tools.
pub struct ToolRegistry {
    store: Arc<dyn DocumentStore>,

    /// Held for the whole of a dispatch.
    dispatch_lock: Mutex<()>,
}

impl ToolRegistry {
    /// Create a new tool registry backed by `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            dispatch_lock: Mutex::new(()),
        }
    }

    /// Get all tool names, in catalog order.
    pub fn tool_names() -> Vec<&'static str> {
        vec![
            GetItemTool::NAME,
            PutItemTool::NAME,
            UpdateItemTool::NAME,
            QueryContainerTool::NAME,
            ListContainersTool::NAME,
            SampleItemTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for the tool catalog.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            GetItemTool::to_tool(),
            PutItemTool::to_tool(),
            UpdateItemTool::to_tool(),
            QueryContainerTool::to_tool(),
            ListContainersTool::to_tool(),
            SampleItemTool::to_tool(),
        ]
    }

    /// Call a tool by name.
    ///
    /// Always produces exactly one result. Only unknown tools, invalid
    /// arguments and handler panics set `isError`; store failures are
    /// reported inside the result with `success: false`.
    pub async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let arguments = arguments.unwrap_or_default();

        let _guard = self.dispatch_lock.lock().await;
        debug!("Acquired dispatch lock for {}", name);

        match AssertUnwindSafe(self.dispatch(name, arguments))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result.into_call_tool_result(),
            Ok(Err(e)) => {
                warn!(kind = ?e.kind(), "Tool call rejected: {}", e);
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
            Err(panic) => {
                let e = ToolError::internal(panic_message(panic.as_ref()));
                error!("Tool {} panicked: {}", name, e);
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: JsonObject) -> Result<OperationResult, ToolError> {
        info!("Dispatching tool call: {}", name);
        let store = self.store.as_ref();

        let result = match name {
            GetItemTool::NAME => GetItemTool::execute(&parse(name, arguments)?, store).await,
            PutItemTool::NAME => PutItemTool::execute(&parse(name, arguments)?, store).await,
            UpdateItemTool::NAME => UpdateItemTool::execute(&parse(name, arguments)?, store).await,
            QueryContainerTool::NAME => {
                QueryContainerTool::execute(&parse(name, arguments)?, store).await
            }
            ListContainersTool::NAME => {
                ListContainersTool::execute(&parse(name, arguments)?, store).await
            }
            SampleItemTool::NAME => SampleItemTool::execute(&parse(name, arguments)?, store).await,
            _ => return Err(ToolError::UnknownTool(name.to_string())),
        };

        Ok(result)
    }
}

/// Deserialize tool arguments into the tool's params type.
fn parse<T: DeserializeOwned>(tool: &str, arguments: JsonObject) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(tool, e.to_string()))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "tool handler panicked".to_string()
    }
}
