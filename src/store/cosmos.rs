//! Azure Cosmos DB REST client.
//!
//! Talks to the SQL API of a Cosmos DB account using master-key
//! authorization. Every request is signed with HMAC-SHA256 over the verb,
//! resource type, resource link and request date.
//!
//! The gateway cannot run cross-partition `ORDER BY` queries, so
//! [`DocumentStore::recent_items`] queries each partition key range on its
//! own and merges the results client-side.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, warn};

use super::{
    Document, DocumentStore, SqlQuery, StoreError, StoreResult, document_id, merge_newest,
    recent_items_query,
};
use crate::core::config::CosmosConfig;

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2018-12-31";

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_UPSERT: &str = "x-ms-documentdb-is-upsert";
const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_PARTITION_KEY_RANGE: &str = "x-ms-documentdb-partitionkeyrangeid";

/// What a request was doing, used to classify `400 Bad Request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Document,
    Query,
    Metadata,
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
struct ServiceError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    #[serde(rename = "DocumentCollections", default)]
    collections: Vec<CollectionInfo>,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyRangeList {
    #[serde(rename = "PartitionKeyRanges", default)]
    ranges: Vec<PartitionKeyRange>,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyRange {
    id: String,
}

/// Cosmos DB client bound to one database.
pub struct CosmosStore {
    client: reqwest::Client,
    endpoint: String,
    key: Vec<u8>,
    database: String,
}

/// Custom Debug implementation to keep the master key out of logs.
impl std::fmt::Debug for CosmosStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosStore")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

impl CosmosStore {
    /// Create a client for `database` on the account at `endpoint`.
    ///
    /// `key` is the base64 master key as shown in the Azure portal.
    pub fn new(
        endpoint: impl Into<String>,
        key: &str,
        database: impl Into<String>,
    ) -> StoreResult<Self> {
        let key = BASE64
            .decode(key.trim())
            .map_err(|e| StoreError::configuration(format!("master key is not valid base64: {e}")))?;

        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(StoreError::configuration("endpoint must not be empty"));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            key,
            database: database.into(),
        })
    }

    /// Create a client from the server configuration.
    pub fn from_config(config: &CosmosConfig) -> StoreResult<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| StoreError::configuration("no Cosmos DB endpoint configured"))?;
        let key = config
            .key
            .as_deref()
            .ok_or_else(|| StoreError::configuration("no Cosmos DB key configured"))?;

        Self::new(endpoint, key, config.database.clone())
    }

    fn collection_link(&self, container: &str) -> String {
        format!("dbs/{}/colls/{}", self.database, container)
    }

    fn document_link(&self, container: &str, id: &str) -> String {
        format!("{}/docs/{}", self.collection_link(container), id)
    }

    /// Build the request URL for a resource path, percent-encoding each segment.
    fn url(&self, path: &str) -> String {
        let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
        format!("{}/{}", self.endpoint, encoded.join("/"))
    }

    /// Compute the `authorization` header value for a request.
    fn authorization(
        &self,
        method: &Method,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> StoreResult<String> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            method.as_str().to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| StoreError::configuration(e.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={signature}");
        Ok(urlencoding::encode(&token).into_owned())
    }

    /// Start a signed request.
    ///
    /// `resource_link` is what gets signed; `path` is what gets requested.
    /// They differ for feed operations (create, query, list).
    fn request(
        &self,
        method: Method,
        resource_type: &str,
        resource_link: &str,
        path: &str,
    ) -> StoreResult<RequestBuilder> {
        let date = rfc1123(Utc::now());
        let authorization = self.authorization(&method, resource_type, resource_link, &date)?;

        Ok(self
            .client
            .request(method, self.url(path))
            .header(header::AUTHORIZATION, authorization)
            .header(header::ACCEPT, "application/json")
            .header(HEADER_DATE, date)
            .header(HEADER_VERSION, API_VERSION))
    }

    async fn send(&self, request: RequestBuilder, operation: Operation) -> StoreResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify(status, &body, operation);
        debug!("Cosmos DB request failed ({}): {}", status, err);
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Ids of the partition key ranges a container is split into.
    async fn partition_key_ranges(&self, container: &str) -> StoreResult<Vec<String>> {
        let link = self.collection_link(container);
        let request = self.request(Method::GET, "pkranges", &link, &format!("{link}/pkranges"))?;

        let response = self.send(request, Operation::Metadata).await?;
        let list: PartitionKeyRangeList = Self::decode(response).await?;
        Ok(list.ranges.into_iter().map(|r| r.id).collect())
    }

    /// Run a query, following continuation tokens until every page is read.
    ///
    /// With a `range` the query is pinned to that partition key range;
    /// otherwise it fans out across partitions on the gateway.
    async fn query_pages(
        &self,
        container: &str,
        query: &SqlQuery,
        range: Option<&str>,
    ) -> StoreResult<Vec<Document>> {
        let link = self.collection_link(container);
        let path = format!("{link}/docs");
        let body = serde_json::to_vec(query)?;

        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::POST, "docs", &link, &path)?
                .header(header::CONTENT_TYPE, "application/query+json")
                .header(HEADER_IS_QUERY, "True")
                .body(body.clone());
            request = match range {
                Some(range) => request.header(HEADER_PARTITION_KEY_RANGE, range),
                None => request.header(HEADER_CROSS_PARTITION, "True"),
            };
            if let Some(token) = &continuation {
                request = request.header(HEADER_CONTINUATION, token.as_str());
            }

            let response = self.send(request, Operation::Query).await?;
            continuation = response
                .headers()
                .get(HEADER_CONTINUATION)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_owned);

            let page: QueryPage = Self::decode(response).await?;
            debug!("Fetched query page with {} documents", page.documents.len());
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for CosmosStore {
    fn database(&self) -> &str {
        &self.database
    }

    async fn read_item(
        &self,
        container: &str,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<Option<Document>> {
        let link = self.document_link(container, id);
        let request = self
            .request(Method::GET, "docs", &link, &link)?
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key)?);

        match self.send(request, Operation::Document).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn upsert_item(
        &self,
        container: &str,
        item: Document,
        partition_key: Option<&str>,
    ) -> StoreResult<Document> {
        let partition_key = match partition_key {
            Some(pk) => pk,
            None => document_id(&item)?,
        };
        let partition_key = partition_key_header(partition_key)?;

        let link = self.collection_link(container);
        let request = self
            .request(Method::POST, "docs", &link, &format!("{link}/docs"))?
            .header(HEADER_PARTITION_KEY, partition_key)
            .header(HEADER_UPSERT, "True")
            .json(&item);

        let response = self.send(request, Operation::Document).await?;
        Self::decode(response).await
    }

    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        partition_key: &str,
        item: Document,
    ) -> StoreResult<Document> {
        let link = self.document_link(container, id);
        let request = self
            .request(Method::PUT, "docs", &link, &link)?
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key)?)
            .json(&item);

        let response = self.send(request, Operation::Document).await?;
        Self::decode(response).await
    }

    async fn query_items(&self, container: &str, query: &SqlQuery) -> StoreResult<Vec<Document>> {
        self.query_pages(container, query, None).await
    }

    async fn list_containers(&self) -> StoreResult<Vec<String>> {
        let link = format!("dbs/{}", self.database);
        let request = self.request(Method::GET, "colls", &link, &format!("{link}/colls"))?;

        let response = self.send(request, Operation::Metadata).await?;
        let list: CollectionList = Self::decode(response).await?;
        Ok(list.collections.into_iter().map(|c| c.id).collect())
    }

    async fn recent_items(&self, container: &str, limit: usize) -> StoreResult<Vec<Document>> {
        let query = recent_items_query(limit);
        let ranges = self.partition_key_ranges(container).await?;
        debug!("Sampling {} partition key ranges of {}", ranges.len(), container);

        let mut pages = Vec::with_capacity(ranges.len());
        for range in &ranges {
            pages.push(self.query_pages(container, &query, Some(range.as_str())).await?);
        }

        Ok(merge_newest(pages, limit))
    }
}

/// Format a timestamp the way the `x-ms-date` header expects.
fn rfc1123(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Partition keys travel as a JSON array with a single value.
fn partition_key_header(partition_key: &str) -> StoreResult<String> {
    Ok(serde_json::to_string(&[partition_key])?)
}

/// Map a failed response onto a store error.
fn classify(status: StatusCode, body: &str, operation: Operation) -> StoreError {
    let message = match serde_json::from_str::<ServiceError>(body) {
        Ok(ServiceError {
            message: Some(message),
            ..
        }) => message,
        Ok(ServiceError {
            code: Some(code),
            message: None,
        }) => code,
        _ if body.is_empty() => status.to_string(),
        _ => body.to_string(),
    };

    match status {
        StatusCode::BAD_REQUEST if operation == Operation::Query => StoreError::InvalidQuery(message),
        StatusCode::BAD_REQUEST => StoreError::InvalidDocument(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => StoreError::Transient(message),
        _ => {
            warn!("Unexpected Cosmos DB status {}", status);
            StoreError::Service {
                status: status.as_u16(),
                message,
            }
        }
    }
}
