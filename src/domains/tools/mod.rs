//! Tools domain module.
//!
//! Tools are the operations MCP clients can invoke against the document
//! store. Every tool returns an [`OperationResult`] envelope.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `registry.rs` - Tool catalog and call dispatch
//! - `result.rs` - The result envelope and its MCP rendering
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a params struct,
//!    `execute()` and `to_tool()`
//! 2. Export it in `definitions/mod.rs`
//! 3. Add it to the catalog and the dispatch match in `registry.rs`

pub mod definitions;
mod error;
mod registry;
mod result;

pub use error::{ToolError, ToolErrorKind};
pub use registry::ToolRegistry;
pub use result::{FieldSchema, OperationResult};
