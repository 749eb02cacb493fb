//! Domains module containing business logic organized by bounded contexts.
//!
//! The server currently has a single domain, `tools`: the operations MCP
//! clients can invoke against the document store.

pub mod tools;
