//! Document store abstraction.
//!
//! Tools never talk to Cosmos DB directly: they receive a [`DocumentStore`]
//! handle that is constructed once at startup and injected into the server.
//!
//! - `cosmos.rs` - REST client for an Azure Cosmos DB account
//! - `memory.rs` - in-process store used as a test double (tests and the
//!   `test-util` feature only)
//! - `error.rs` - store error type and error kinds

mod cosmos;
mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use cosmos::CosmosStore;
pub use error::{StoreError, StoreErrorKind, StoreResult};
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;

/// Newest documents first, by server write timestamp.
const RECENT_ITEMS_QUERY: &str = "SELECT TOP @limit * FROM c ORDER BY c._ts DESC";

/// A single JSON document stored in a container.
pub type Document = Map<String, Value>;

/// A named parameter bound into a SQL query (`@name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryParameter {
    /// Parameter name including the leading `@`.
    pub name: String,

    /// Value substituted for the parameter.
    pub value: Value,
}

/// A parameterized SQL query against a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlQuery {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
}

impl SqlQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind a parameter value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Operations the tools need from a document database.
///
/// All operations target the database the store was configured with;
/// containers are addressed per call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this store is bound to.
    fn database(&self) -> &str;

    /// Point-read a document. A missing document is `Ok(None)`.
    async fn read_item(
        &self,
        container: &str,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<Option<Document>>;

    /// Create the document, replacing any existing document with the same id.
    ///
    /// When `partition_key` is `None` the document's `id` is used.
    async fn upsert_item(
        &self,
        container: &str,
        item: Document,
        partition_key: Option<&str>,
    ) -> StoreResult<Document>;

    /// Replace an existing document.
    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        partition_key: &str,
        item: Document,
    ) -> StoreResult<Document>;

    /// Run a query and collect every page of results.
    async fn query_items(&self, container: &str, query: &SqlQuery) -> StoreResult<Vec<Document>>;

    /// List the ids of all containers in the database.
    async fn list_containers(&self) -> StoreResult<Vec<String>>;

    /// The `limit` most recently written documents, newest first.
    async fn recent_items(&self, container: &str, limit: usize) -> StoreResult<Vec<Document>> {
        self.query_items(container, &recent_items_query(limit)).await
    }
}

pub(crate) fn recent_items_query(limit: usize) -> SqlQuery {
    SqlQuery::new(RECENT_ITEMS_QUERY).with_parameter("@limit", limit)
}

/// Merge per-partition result sets into the `limit` newest documents.
///
/// Documents without a numeric `_ts` sort last.
pub(crate) fn merge_newest(pages: Vec<Vec<Document>>, limit: usize) -> Vec<Document> {
    let mut documents: Vec<Document> = pages.into_iter().flatten().collect();
    documents.sort_by_key(|doc| std::cmp::Reverse(doc.get("_ts").and_then(Value::as_i64)));
    documents.truncate(limit);
    documents
}

/// Extract the `id` field of a document, which must be a string.
pub(crate) fn document_id(item: &Document) -> StoreResult<&str> {
    item.get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("item must have a string 'id' field".into()))
}
