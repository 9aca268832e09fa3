//! Wire shapes for the `/ask` endpoint
//!
//! The HTTP front end is a thin external consumer; it serializes these
//! types as-is. Field names match the deployed JSON contract.

use crate::error::RagdeskError;
use crate::types::{Answer, SourceRef};
use serde::{Deserialize, Serialize};

/// Successful `/ask` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub source_metadata: Vec<SourceMetadata>,
    /// Seconds, matching the original contract
    pub processing_time: f64,
    pub model_used: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub source_file: String,
    pub chunk_index: i64,
    pub similarity_score: f32,
}

impl From<SourceRef> for SourceMetadata {
    fn from(source: SourceRef) -> Self {
        Self {
            source_file: source.source_file,
            chunk_index: source.chunk_index,
            similarity_score: source.similarity_score,
        }
    }
}

impl From<Answer> for AskResponse {
    fn from(answer: Answer) -> Self {
        Self {
            answer: answer.text,
            source_metadata: answer.sources.into_iter().map(Into::into).collect(),
            processing_time: answer.processing_time_ms as f64 / 1000.0,
            model_used: answer.model_used,
            confidence: answer.confidence,
        }
    }
}

/// Error response body: `{"error": {"code", "message", "details"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// User-safe message for post-fallback LLM failure; raw provider errors
/// never reach the caller.
pub const LLM_FAILURE_MESSAGE: &str =
    "Sorry, I could not generate an answer right now. Please try again in a moment.";

impl ApiError {
    /// Map a pipeline error to its wire code, HTTP status and user-facing
    /// message
    pub fn from_error(error: &RagdeskError) -> (Self, u16) {
        let (code, status, message, details) = match error {
            RagdeskError::Validation(msg) => {
                ("VALIDATION_ERROR", 400, msg.clone(), None)
            }
            RagdeskError::RateLimitExceeded => (
                "RATE_LIMIT_EXCEEDED",
                429,
                "Too many requests, please retry later".to_string(),
                None,
            ),
            RagdeskError::Retrieval(_) | RagdeskError::Database(_) => {
                // Store internals stay in the logs, not on the wire
                tracing::error!("retrieval failure: {}", error);
                (
                    "SERVICE_UNAVAILABLE",
                    503,
                    "The knowledge base is temporarily unavailable".to_string(),
                    None,
                )
            }
            RagdeskError::LlmTimeout
            | RagdeskError::LlmHttp { .. }
            | RagdeskError::LlmMalformed(_)
            | RagdeskError::Http(_) => {
                ("INTERNAL_ERROR", 500, LLM_FAILURE_MESSAGE.to_string(), None)
            }
            RagdeskError::Timeout => (
                "INTERNAL_ERROR",
                500,
                "The request took too long to process".to_string(),
                None,
            ),
            other => {
                tracing::error!("internal failure: {}", other);
                (
                    "INTERNAL_ERROR",
                    500,
                    "An internal error occurred while processing your request".to_string(),
                    None,
                )
            }
        };

        (
            Self {
                error: ApiErrorBody {
                    code: code.to_string(),
                    message,
                    details,
                },
            },
            status,
        )
    }
}
