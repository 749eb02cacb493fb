//! Query container tool definition.
//!
//! Runs a parameterized SQL query and returns every matching document.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::domains::tools::definitions::common::tool_model;
use crate::domains::tools::{OperationResult, ToolError};
use crate::store::{DocumentStore, QueryParameter, SqlQuery};

/// Parameters for the query container tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryContainerParams {
    /// Name of the container to query.
    pub container_name: String,

    /// SQL query text, e.g. `SELECT * FROM c WHERE c.status = @status`.
    pub query: String,

    /// Values for the `@name` placeholders used in the query.
    pub parameters: Vec<QueryParameter>,
}

/// Query container tool.
pub struct QueryContainerTool;

impl QueryContainerTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "query_container";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Run a parameterized SQL query against a Cosmos DB container and return all matching items.";

    #[instrument(skip_all, fields(container = %params.container_name))]
    pub async fn execute(
        params: &QueryContainerParams,
        store: &dyn DocumentStore,
    ) -> OperationResult {
        info!("Query container tool called");
        debug!("Query: {}", params.query);
        OperationResult::from_outcome("query container", Self::run(params, store).await)
    }

    async fn run(
        params: &QueryContainerParams,
        store: &dyn DocumentStore,
    ) -> Result<OperationResult, ToolError> {
        let query = SqlQuery {
            query: params.query.clone(),
            parameters: params.parameters.clone(),
        };
        let items = store.query_items(&params.container_name, &query).await?;

        info!("Query returned {} items", items.len());
        Ok(OperationResult::success("Query executed successfully").with_items(items))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<QueryContainerParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store.insert("tasks", json!({ "id": "1", "status": "open" }));
        store.insert("tasks", json!({ "id": "2", "status": "done" }));
        store.insert("tasks", json!({ "id": "3", "status": "open" }));
        store
    }

    #[tokio::test]
    async fn test_query_with_parameters() {
        let params: QueryContainerParams = serde_json::from_value(json!({
            "containerName": "tasks",
            "query": "SELECT * FROM c WHERE c.status = @status",
            "parameters": [{ "name": "@status", "value": "open" }]
        }))
        .unwrap();

        let result = QueryContainerTool::execute(&params, &store()).await;
        assert!(result.success, "{}", result.message);
        assert_eq!(result.items.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_query() {
        let params = QueryContainerParams {
            container_name: "tasks".to_string(),
            query: "SELEKT * FROM c".to_string(),
            parameters: Vec::new(),
        };

        let result = QueryContainerTool::execute(&params, &store()).await;
        assert!(!result.success);
        assert!(result.message.contains("Failed to query container"));
        assert!(result.items.is_none());
    }

    #[test]
    fn test_parameters_are_required() {
        let parsed = serde_json::from_value::<QueryContainerParams>(json!({
            "containerName": "tasks",
            "query": "SELECT * FROM c"
        }));
        assert!(parsed.is_err());
    }
}
