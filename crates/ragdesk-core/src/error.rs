//! Error types for ragdesk

use thiserror::Error;

/// Result type alias using RagdeskError
pub type Result<T> = std::result::Result<T, RagdeskError>;

/// Error type alias for convenience
pub type Error = RagdeskError;

/// Main error type for ragdesk
#[derive(Debug, Error)]
pub enum RagdeskError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Vector store error: {0}")]
    Retrieval(String),

    #[error("Vector store database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("LLM request timed out")]
    LlmTimeout,

    #[error("LLM service error (HTTP {status}): {body}")]
    LlmHttp { status: u16, body: String },

    #[error("Malformed LLM response: {0}")]
    LlmMalformed(String),

    #[error("Request deadline exceeded")]
    Timeout,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RagdeskError {
    /// Whether the LLM retry policy applies: timeouts and 5xx-class errors
    /// are transient, everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LlmTimeout => true,
            Self::LlmHttp { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RagdeskError::LlmTimeout.is_retryable());
        assert!(RagdeskError::LlmHttp {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!RagdeskError::LlmHttp {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!RagdeskError::LlmMalformed("no choices".into()).is_retryable());
        assert!(!RagdeskError::Validation("too short".into()).is_retryable());
    }
}
