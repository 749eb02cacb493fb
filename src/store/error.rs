//! Document store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    InvalidQuery,
    InvalidDocument,
    Unauthorized,
    Transient,
    Unknown,
}

/// Errors returned by a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed database, container or document does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The query text or its parameters were rejected.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The document was rejected (missing id, malformed body, ...).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The credential was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Throttling, timeouts and unavailable service responses.
    #[error("Service temporarily unavailable: {0}")]
    Transient(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Any other non-success response.
    #[error("Request failed with status {status}: {message}")]
    Service { status: u16, message: String },

    /// A request or response body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client could not be constructed from its configuration.
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::InvalidQuery(_) => StoreErrorKind::InvalidQuery,
            Self::InvalidDocument(_) => StoreErrorKind::InvalidDocument,
            Self::Unauthorized(_) => StoreErrorKind::Unauthorized,
            Self::Transient(_) | Self::Network(_) => StoreErrorKind::Transient,
            Self::Service { .. } | Self::Serialization(_) | Self::Configuration(_) => {
                StoreErrorKind::Unknown
            }
        }
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            StoreError::NotFound("x".into()).kind(),
            StoreErrorKind::NotFound
        );
        assert_eq!(
            StoreError::Transient("429".into()).kind(),
            StoreErrorKind::Transient
        );
        assert_eq!(
            StoreError::Service {
                status: 409,
                message: "conflict".into()
            }
            .kind(),
            StoreErrorKind::Unknown
        );
    }

    #[test]
    fn test_display_keeps_cause() {
        let err = StoreError::InvalidQuery("Syntax error near 'FORM'".into());
        assert_eq!(err.to_string(), "Invalid query: Syntax error near 'FORM'");
    }
}
