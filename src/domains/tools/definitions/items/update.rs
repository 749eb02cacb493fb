//! Update item tool definition.
//!
//! Reads the current document, shallow-merges the supplied fields over it
//! and replaces it. There is no concurrency control between the read and
//! the replace.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domains::tools::definitions::common::tool_model;
use crate::domains::tools::{OperationResult, ToolError};
use crate::store::{Document, DocumentStore};

/// Parameters for the update item tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemParams {
    /// Name of the container holding the item.
    pub container_name: String,

    /// Id of the item to update.
    pub id: String,

    /// Fields to set. Fields not named here are kept.
    pub updates: Document,

    /// Partition key value of the item (defaults to the id).
    #[serde(default)]
    pub partition_key: Option<String>,
}

/// Update item tool - read, merge, replace.
pub struct UpdateItemTool;

impl UpdateItemTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "update_item";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Update fields of an existing item in a Cosmos DB container.";

    #[instrument(skip_all, fields(container = %params.container_name, id = %params.id))]
    pub async fn execute(params: &UpdateItemParams, store: &dyn DocumentStore) -> OperationResult {
        info!("Update item tool called");
        OperationResult::from_outcome("update item", Self::run(params, store).await)
    }

    async fn run(
        params: &UpdateItemParams,
        store: &dyn DocumentStore,
    ) -> Result<OperationResult, ToolError> {
        let partition_key = params.partition_key.as_deref().unwrap_or(&params.id);

        let current = store
            .read_item(&params.container_name, &params.id, partition_key)
            .await?
            .ok_or(ToolError::ItemNotFound)?;

        let merged = merge(current, &params.updates);
        debug!("Replacing item with {} fields", merged.len());

        let updated = store
            .replace_item(&params.container_name, &params.id, partition_key, merged)
            .await?;

        Ok(OperationResult::success("Item updated successfully").with_item(Some(updated)))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<UpdateItemParams>(Self::NAME, Self::DESCRIPTION)
    }
}

/// Shallow merge: top-level fields of `updates` overwrite those of `current`.
fn merge(mut current: Document, updates: &Document) -> Document {
    for (key, value) in updates {
        current.insert(key.clone(), value.clone());
    }
    current
}
