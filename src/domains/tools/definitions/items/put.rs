//! Put item tool definition.
//!
//! Inserts a document, replacing any existing document with the same id.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::tool_model;
use crate::domains::tools::{OperationResult, ToolError};
use crate::store::{Document, DocumentStore};

/// Parameters for the put item tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutItemParams {
    /// Name of the container to write to.
    pub container_name: String,

    /// The item to store. Must contain a string `id` field.
    pub item: Document,

    /// Partition key value of the item (defaults to the item's id).
    #[serde(default)]
    pub partition_key: Option<String>,
}

/// Put item tool - upserts one document.
pub struct PutItemTool;

impl PutItemTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "put_item";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Insert or replace an item in a Cosmos DB container.";

    #[instrument(skip_all, fields(container = %params.container_name))]
    pub async fn execute(params: &PutItemParams, store: &dyn DocumentStore) -> OperationResult {
        info!("Put item tool called");
        OperationResult::from_outcome("put item", Self::run(params, store).await)
    }

    async fn run(
        params: &PutItemParams,
        store: &dyn DocumentStore,
    ) -> Result<OperationResult, ToolError> {
        let created = store
            .upsert_item(
                &params.container_name,
                params.item.clone(),
                params.partition_key.as_deref(),
            )
            .await?;

        Ok(OperationResult::success("Item added successfully").with_item(Some(created)))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<PutItemParams>(Self::NAME, Self::DESCRIPTION)
    }
}
