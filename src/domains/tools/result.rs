//! Uniform result envelope returned by every tool.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::ToolError;
use crate::store::Document;

/// Outcome of a tool invocation.
///
/// Always carries `success` and `message`; the remaining fields are present
/// depending on the operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Document>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Document>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub containers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<FieldSchema>>,
}

/// One field of a sampled document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub sample: Value,
}

impl OperationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_item(mut self, item: Option<Document>) -> Self {
        self.item = item;
        self
    }

    pub fn with_items(mut self, items: Vec<Document>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_containers(mut self, containers: Vec<String>) -> Self {
        self.containers = Some(containers);
        self
    }

    pub fn with_schema(mut self, schema: Vec<FieldSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Turn a handler outcome into a result, reporting failures as
    /// `Failed to <action>: <error>`.
    pub fn from_outcome(action: &str, outcome: Result<Self, ToolError>) -> Self {
        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(kind = ?e.kind(), "Failed to {}: {}", action, e);
                Self::failure(format!("Failed to {action}: {e}"))
            }
        }
    }

    /// Render as MCP tool content: one text block with pretty-printed JSON.
    ///
    /// `success: false` is still a regular (non-error) tool result.
    pub fn into_call_tool_result(self) -> CallToolResult {
        match serde_json::to_string_pretty(&self) {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => CallToolResult::error(vec![Content::text(format!(
                "Failed to serialize result: {e}"
            ))]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_omitted() {
        let value = serde_json::to_value(OperationResult::success("ok")).unwrap();
        assert_eq!(value, json!({ "success": true, "message": "ok" }));
    }

    #[test]
    fn test_schema_field_is_named_type() {
        let result = OperationResult::success("ok").with_schema(vec![FieldSchema {
            field: "id".into(),
            field_type: "string".into(),
            sample: json!("1"),
        }]);
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(
            value["schema"],
            json!([{ "field": "id", "type": "string", "sample": "1" }])
        );
    }

    #[test]
    fn test_from_outcome_formats_failure() {
        let result = OperationResult::from_outcome("update item", Err(ToolError::ItemNotFound));
        assert!(!result.success);
        assert_eq!(result.message, "Failed to update item: Item not found");
    }

    #[test]
    fn test_failure_is_not_a_protocol_error() {
        let result = OperationResult::failure("Failed to get item: boom").into_call_tool_result();
        assert!(!result.is_error.unwrap_or(false));

        let text = match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        };
        assert!(text.contains("\"success\": false"));
    }
}
