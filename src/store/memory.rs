//! In-process document store.
//!
//! Keeps containers in memory and understands a small subset of the SQL
//! dialect:
//!
//! ```text
//! SELECT [TOP <n|@param>] * FROM <alias>
//!     [WHERE <alias>.<field> = <@param|literal>]
//!     [ORDER BY <alias>.<field> [ASC|DESC]]
//! ```
//!
//! Anything else is rejected as an invalid query. Each write stamps the
//! document with a monotonically increasing `_ts`.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::{Document, DocumentStore, SqlQuery, StoreError, StoreResult, document_id};

/// In-memory [`DocumentStore`].
#[derive(Debug)]
pub struct MemoryStore {
    database: String,
    containers: Mutex<BTreeMap<String, Vec<Document>>>,
    clock: AtomicI64,
    replace_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store for `database`.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            containers: Mutex::new(BTreeMap::new()),
            clock: AtomicI64::new(1_700_000_000),
            replace_calls: AtomicUsize::new(0),
        }
    }

    /// Create an empty container.
    pub fn with_container(self, container: impl Into<String>) -> Self {
        self.lock().entry(container.into()).or_default();
        self
    }

    /// Insert a document directly, stamping `_ts` if absent.
    pub fn insert(&self, container: &str, item: Value) {
        let Value::Object(mut item) = item else {
            return;
        };
        if !item.contains_key("_ts") {
            item.insert("_ts".into(), self.tick().into());
        }
        self.lock().entry(container.to_string()).or_default().push(item);
    }

    /// Number of `replace_item` calls served so far.
    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Document>>> {
        self.containers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn container_missing(container: &str) -> StoreError {
        StoreError::NotFound(format!("container '{container}' does not exist"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("todos")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn database(&self) -> &str {
        &self.database
    }

    async fn read_item(
        &self,
        container: &str,
        id: &str,
        _partition_key: &str,
    ) -> StoreResult<Option<Document>> {
        let containers = self.lock();
        let Some(items) = containers.get(container) else {
            return Ok(None);
        };
        Ok(items
            .iter()
            .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
            .cloned())
    }

    async fn upsert_item(
        &self,
        container: &str,
        mut item: Document,
        _partition_key: Option<&str>,
    ) -> StoreResult<Document> {
        let id = document_id(&item)?.to_string();
        item.insert("_ts".into(), self.tick().into());

        let mut containers = self.lock();
        let items = containers
            .get_mut(container)
            .ok_or_else(|| Self::container_missing(container))?;

        match items
            .iter_mut()
            .find(|existing| existing.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(item)
    }

    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        _partition_key: &str,
        mut item: Document,
    ) -> StoreResult<Document> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if document_id(&item)? != id {
            return Err(StoreError::InvalidDocument(
                "replacement id does not match the addressed document".into(),
            ));
        }
        item.insert("_ts".into(), self.tick().into());

        let mut containers = self.lock();
        let items = containers
            .get_mut(container)
            .ok_or_else(|| Self::container_missing(container))?;
        let existing = items
            .iter_mut()
            .find(|existing| existing.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("document '{id}' does not exist")))?;

        *existing = item.clone();
        Ok(item)
    }

    async fn query_items(&self, container: &str, query: &SqlQuery) -> StoreResult<Vec<Document>> {
        let plan = QueryPlan::parse(query)?;

        let containers = self.lock();
        let items = containers
            .get(container)
            .ok_or_else(|| Self::container_missing(container))?;

        let mut results: Vec<Document> = items
            .iter()
            .filter(|item| plan.matches(item))
            .cloned()
            .collect();

        if let Some((field, descending)) = &plan.order_by {
            results.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                if *descending { ordering.reverse() } else { ordering }
            });
        }
        if let Some(top) = plan.top {
            results.truncate(top);
        }
        Ok(results)
    }

    async fn list_containers(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Parsed form of a supported query.
#[derive(Debug, Default)]
struct QueryPlan {
    top: Option<usize>,
    filter: Option<(String, Value)>,
    order_by: Option<(String, bool)>,
}

impl QueryPlan {
    fn parse(query: &SqlQuery) -> StoreResult<Self> {
        let tokens: Vec<&str> = query.query.split_whitespace().collect();
        let mut cursor = Tokens {
            tokens: &tokens,
            pos: 0,
            query,
        };
        let mut plan = Self::default();

        cursor.keyword("SELECT")?;
        if cursor.peek_keyword("TOP") {
            cursor.pos += 1;
            let top = cursor.value()?;
            let top = top
                .as_u64()
                .ok_or_else(|| syntax_error("TOP expects a non-negative integer"))?;
            plan.top = Some(top as usize);
        }
        cursor.expect("*")?;
        cursor.keyword("FROM")?;
        let alias = cursor.next()?.to_string();

        if cursor.peek_keyword("WHERE") {
            cursor.pos += 1;
            let field = cursor.field(&alias)?;
            cursor.expect("=")?;
            plan.filter = Some((field, cursor.value()?));
        }

        if cursor.peek_keyword("ORDER") {
            cursor.pos += 1;
            cursor.keyword("BY")?;
            let field = cursor.field(&alias)?;
            let descending = if cursor.peek_keyword("DESC") {
                cursor.pos += 1;
                true
            } else {
                if cursor.peek_keyword("ASC") {
                    cursor.pos += 1;
                }
                false
            };
            plan.order_by = Some((field, descending));
        }

        if let Some(extra) = tokens.get(cursor.pos) {
            return Err(syntax_error(&format!("unexpected token '{extra}'")));
        }
        Ok(plan)
    }

    fn matches(&self, item: &Document) -> bool {
        match &self.filter {
            Some((field, expected)) => item.get(field) == Some(expected),
            None => true,
        }
    }
}

struct Tokens<'a> {
    tokens: &'a [&'a str],
    pos: usize,
    query: &'a SqlQuery,
}

impl<'a> Tokens<'a> {
    fn next(&mut self) -> StoreResult<&'a str> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or_else(|| syntax_error("unexpected end of query"))?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.tokens
            .get(self.pos)
            .is_some_and(|t| t.eq_ignore_ascii_case(keyword))
    }

    fn keyword(&mut self, keyword: &str) -> StoreResult<()> {
        let token = self.next()?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(syntax_error(&format!("expected {keyword} near '{token}'")))
        }
    }

    fn expect(&mut self, literal: &str) -> StoreResult<()> {
        let token = self.next()?;
        if token == literal {
            Ok(())
        } else {
            Err(syntax_error(&format!("expected '{literal}' near '{token}'")))
        }
    }

    /// `<alias>.<field>`
    fn field(&mut self, alias: &str) -> StoreResult<String> {
        let token = self.next()?;
        token
            .strip_prefix(alias)
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .ok_or_else(|| syntax_error(&format!("invalid property reference '{token}'")))
    }

    /// A parameter reference or a JSON literal.
    fn value(&mut self) -> StoreResult<Value> {
        let token = self.next()?;
        if token.starts_with('@') {
            return self
                .query
                .parameters
                .iter()
                .find(|p| p.name == token)
                .map(|p| p.value.clone())
                .ok_or_else(|| {
                    StoreError::InvalidQuery(format!("parameter {token} was not supplied"))
                });
        }
        let literal = token.replace('\'', "\"");
        serde_json::from_str(&literal)
            .map_err(|_| syntax_error(&format!("invalid literal '{token}'")))
    }
}

fn syntax_error(detail: &str) -> StoreError {
    StoreError::InvalidQuery(format!("Syntax error, {detail}"))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
