//! Get item tool definition.
//!
//! Point-reads a single document by id.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::tool_model;
use crate::domains::tools::{OperationResult, ToolError};
use crate::store::DocumentStore;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the get item tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetItemParams {
    /// Name of the container holding the item.
    pub container_name: String,

    /// Id of the item to read.
    pub id: String,

    /// Partition key value of the item (defaults to the id).
    #[serde(default)]
    pub partition_key: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Get item tool - reads one document by id.
pub struct GetItemTool;

impl GetItemTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_item";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Retrieve an item from a Cosmos DB container by its id.";

    /// Execute the tool logic.
    ///
    /// A missing item is not an error: the result is successful and carries
    /// no `item`.
    #[instrument(skip_all, fields(container = %params.container_name, id = %params.id))]
    pub async fn execute(params: &GetItemParams, store: &dyn DocumentStore) -> OperationResult {
        info!("Get item tool called");
        OperationResult::from_outcome("get item", Self::run(params, store).await)
    }

    async fn run(
        params: &GetItemParams,
        store: &dyn DocumentStore,
    ) -> Result<OperationResult, ToolError> {
        let partition_key = params.partition_key.as_deref().unwrap_or(&params.id);
        let item = store
            .read_item(&params.container_name, &params.id, partition_key)
            .await?;

        let message = if item.is_some() {
            "Item retrieved successfully".to_string()
        } else {
            info!("No item with id {} in {}", params.id, params.container_name);
            format!(
                "No item with id '{}' exists in container '{}'",
                params.id, params.container_name
            )
        };

        Ok(OperationResult::success(message).with_item(item))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<GetItemParams>(Self::NAME, Self::DESCRIPTION)
    }
}

// ============================================================================
// Tests
// ============================================================================
