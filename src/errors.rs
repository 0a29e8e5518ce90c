//! Error types for docbuddy
//!
//! One taxonomy for the whole pipeline. Retrieval finding nothing relevant is
//! not an error: it is `Retrieval::NotFound` and never shows up here.

use thiserror::Error;

/// Main error type for ingestion and query serving
#[derive(Error, Debug)]
pub enum RagError {
    /// Missing credentials, invalid tunables, unusable settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Vector dimensions disagree between index and query (or within a build)
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Any external provider call that failed
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    /// External call exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Knowledge base load or save failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No complete knowledge base is published for queries
    #[error("Knowledge base unavailable")]
    KnowledgeBaseUnavailable,

    /// Document could not be split into passages
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// Query state machine misuse
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// Shorthand for a provider failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        RagError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::Provider { .. } | RagError::Timeout { .. } | RagError::Http(_)
        )
    }
}
