//! Tool-specific error types.

use thiserror::Error;

use crate::store::{StoreError, StoreErrorKind};

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's input schema.
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// The item addressed by an update does not exist.
    #[error("Item not found")]
    ItemNotFound,

    /// The document store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    UnknownTool,
    InvalidArgument,
    NotFound,
    InvalidQuery,
    Unauthorized,
    Transient,
    Unknown,
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(tool: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            Self::UnknownTool(_) => ToolErrorKind::UnknownTool,
            Self::InvalidArguments { .. } => ToolErrorKind::InvalidArgument,
            Self::ItemNotFound => ToolErrorKind::NotFound,
            Self::Store(e) => match e.kind() {
                StoreErrorKind::NotFound => ToolErrorKind::NotFound,
                StoreErrorKind::InvalidQuery => ToolErrorKind::InvalidQuery,
                StoreErrorKind::InvalidDocument => ToolErrorKind::InvalidArgument,
                StoreErrorKind::Unauthorized => ToolErrorKind::Unauthorized,
                StoreErrorKind::Transient => ToolErrorKind::Transient,
                StoreErrorKind::Unknown => ToolErrorKind::Unknown,
            },
            Self::Internal(_) => ToolErrorKind::Unknown,
        }
    }
}
