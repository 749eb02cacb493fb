//! Sample item tool definition.
//!
//! Returns the most recently written documents of a container together with
//! a rough field schema, so a client can learn what the data looks like
//! without pulling large documents into its context.

use std::num::NonZeroUsize;

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::{default_sample_limit, tool_model};
use crate::domains::tools::{FieldSchema, OperationResult, ToolError};
use crate::store::{Document, DocumentStore};

/// Strings longer than this many characters are truncated.
const MAX_STRING_CHARS: usize = 100;

/// Words kept from a truncated string.
const TRUNCATED_WORDS: usize = 10;

/// Parameters for the sample item tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SampleItemParams {
    /// Name of the container to sample.
    pub container_name: String,

    /// Number of items to return (default: 1).
    #[serde(default = "default_sample_limit")]
    pub limit: NonZeroUsize,
}

/// Sample item tool - newest items with long strings shortened.
pub struct SampleItemTool;

impl SampleItemTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "sample_item";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Return the most recently written items of a Cosmos DB container with long text fields truncated, plus the field names and types of the newest item.";

    #[instrument(skip_all, fields(container = %params.container_name, limit = params.limit.get()))]
    pub async fn execute(params: &SampleItemParams, store: &dyn DocumentStore) -> OperationResult {
        info!("Sample item tool called");
        OperationResult::from_outcome("sample items", Self::run(params, store).await)
    }

    async fn run(
        params: &SampleItemParams,
        store: &dyn DocumentStore,
    ) -> Result<OperationResult, ToolError> {
        let items = store
            .recent_items(&params.container_name, params.limit.get())
            .await?;

        let schema = items.first().map(describe_fields).unwrap_or_default();
        let items: Vec<Document> = items.into_iter().map(truncate_item).collect();

        info!("Sampled {} items", items.len());

        Ok(OperationResult::success(format!("Retrieved {} sample items", items.len()))
            .with_items(items)
            .with_schema(schema))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<SampleItemParams>(Self::NAME, Self::DESCRIPTION)
    }
}

/// Shorten every long string field of a document.
fn truncate_item(item: Document) -> Document {
    item.into_iter()
        .map(|(key, value)| (key, truncate_value(value)))
        .collect()
}

/// Keep the first words of strings over the length limit; leave all other
/// values untouched.
fn truncate_value(value: Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_STRING_CHARS => {
            let words: Vec<&str> = s.split(' ').take(TRUNCATED_WORDS).collect();
            Value::String(format!("{}...", words.join(" ")))
        }
        other => other,
    }
}

/// Field name, raw value type and display sample for each field.
fn describe_fields(item: &Document) -> Vec<FieldSchema> {
    item.iter()
        .map(|(field, value)| FieldSchema {
            field: field.clone(),
            field_type: type_name(value).to_string(),
            sample: truncate_value(value.clone()),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn params(limit: usize) -> SampleItemParams {
        SampleItemParams {
            container_name: "c".to_string(),
            limit: NonZeroUsize::new(limit).unwrap(),
        }
    }

    fn sentence(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{i:02}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_truncate_long_string() {
        // 20 words of 6 chars plus 19 spaces = 139 chars
        let long = sentence(20);
        let truncated = truncate_value(Value::String(long));
        assert_eq!(truncated, json!(format!("{}...", sentence(10))));
    }

    #[test]
    fn test_truncate_boundaries() {
        let exactly_100 = "a".repeat(100);
        assert_eq!(truncate_value(json!(exactly_100.clone())), json!(exactly_100));

        let ninety_nine = "b".repeat(99);
        assert_eq!(truncate_value(json!(ninety_nine.clone())), json!(ninety_nine));

        // A single 101-char word keeps its one word
        let one_word = "c".repeat(101);
        assert_eq!(
            truncate_value(json!(one_word.clone())),
            json!(format!("{one_word}..."))
        );
    }

    #[test]
    fn test_non_strings_untouched() {
        assert_eq!(truncate_value(json!(42)), json!(42));
        assert_eq!(truncate_value(json!([sentence(30)])), json!([sentence(30)]));
        assert_eq!(truncate_value(json!(null)), json!(null));
    }

    #[tokio::test]
    async fn test_sample_newest_first_and_truncated() {
        let store = MemoryStore::default();
        store.insert("c", json!({ "id": "1", "body": "short" }));
        store.insert("c", json!({ "id": "2", "body": sentence(30) }));
        store.insert("c", json!({ "id": "3", "body": "b".repeat(99), "done": false }));

        let result = SampleItemTool::execute(&params(2), &store).await;
        assert!(result.success, "{}", result.message);

        let items = result.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], "3");
        assert_eq!(items[0]["body"], json!("b".repeat(99)));
        assert_eq!(items[1]["id"], "2");
        assert_eq!(items[1]["body"], json!(format!("{}...", sentence(10))));

        let schema = result.schema.unwrap();
        let done = schema.iter().find(|f| f.field == "done").unwrap();
        assert_eq!(done.field_type, "boolean");
        assert_eq!(done.sample, json!(false));
        let ts = schema.iter().find(|f| f.field == "_ts").unwrap();
        assert_eq!(ts.field_type, "number");
    }

    #[tokio::test]
    async fn test_schema_uses_raw_type_and_truncated_sample() {
        let store = MemoryStore::default();
        store.insert("c", json!({ "id": "1", "body": sentence(30) }));

        let result = SampleItemTool::execute(&params(1), &store).await;
        let schema = result.schema.unwrap();
        let body = schema.iter().find(|f| f.field == "body").unwrap();
        assert_eq!(body.field_type, "string");
        assert_eq!(body.sample, json!(format!("{}...", sentence(10))));
    }

    #[tokio::test]
    async fn test_sample_empty_container() {
        let store = MemoryStore::default().with_container("c");

        let result = SampleItemTool::execute(&params(1), &store).await;
        assert!(result.success);
        assert!(result.items.unwrap().is_empty());
        assert!(result.schema.unwrap().is_empty());
    }

    #[test]
    fn test_default_limit() {
        let params: SampleItemParams =
            serde_json::from_value(json!({ "containerName": "c" })).unwrap();
        assert_eq!(params.limit.get(), 1);
    }

    #[test]
    fn test_zero_limit_does_not_deserialize() {
        let err = serde_json::from_value::<SampleItemParams>(
            json!({ "containerName": "c", "limit": 0 }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("nonzero"));
    }
}
