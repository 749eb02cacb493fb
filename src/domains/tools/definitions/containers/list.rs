//! List containers tool definition.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::tool_model;
use crate::domains::tools::{OperationResult, ToolError};
use crate::store::DocumentStore;

/// The list containers tool takes no parameters.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListContainersParams {}

/// List containers tool - ids of every container in the configured database.
pub struct ListContainersTool;

impl ListContainersTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "list_containers";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List all containers in the Cosmos DB database.";

    #[instrument(skip_all, fields(database = %store.database()))]
    pub async fn execute(_params: &ListContainersParams, store: &dyn DocumentStore) -> OperationResult {
        info!("List containers tool called");
        OperationResult::from_outcome("list containers", Self::run(store).await)
    }

    async fn run(store: &dyn DocumentStore) -> Result<OperationResult, ToolError> {
        let containers = store.list_containers().await?;
        Ok(OperationResult::success("Containers listed successfully").with_containers(containers))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<ListContainersParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_list_containers() {
        let store = MemoryStore::default()
            .with_container("tasks")
            .with_container("archive");

        let result = ListContainersTool::execute(&ListContainersParams::default(), &store).await;
        assert!(result.success);
        assert_eq!(
            result.containers.unwrap(),
            vec!["archive".to_string(), "tasks".to_string()]
        );
    }

    #[test]
    fn test_schema_is_empty_object() {
        let tool = ListContainersTool::to_tool();
        assert_eq!(tool.input_schema["type"], "object");
        assert!(tool.input_schema.get("required").is_none());
    }
}
