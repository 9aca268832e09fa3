//! Ragdesk Core Library
//!
//! Query-answering pipeline for a retrieval-augmented helpdesk.
//!
//! # Features
//! - Vector similarity retrieval over pre-ingested chunk collections
//! - Token-budgeted context assembly with near-duplicate pruning
//! - Domain/language prompt construction (English and Bangla)
//! - LLM invocation with retry, backoff and one-shot no-context fallback
//! - Retrieval-based confidence scoring
//! - Bounded FIFO response cache and sliding-window rate limiting

pub mod api;
pub mod cache;
pub mod confidence;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod ratelimit;
pub mod store;
pub mod tokens;
pub mod types;

pub use api::{ApiError, ApiErrorBody, AskResponse, SourceMetadata, LLM_FAILURE_MESSAGE};
pub use cache::ResponseCache;
pub use confidence::ConfidenceScorer;
pub use config::{
    Config, DomainConfig, EmbeddingConfig, LlmServiceConfig, PipelineConfig, HR_SYSTEM_PROMPT,
    MERCHANT_SYSTEM_PROMPT,
};
pub use context::ContextAssembler;
pub use error::{Error, RagdeskError, Result};
pub use llm::{ChatClient, ChatMessage, Embedder, HttpEmbedder, MetricsSnapshot, OpenRouterClient};
pub use pipeline::QueryOrchestrator;
pub use prompt::{Prompt, PromptBuilder};
pub use ratelimit::RateLimiter;
pub use store::{cosine_similarity, SqliteVectorStore, VectorStore};
pub use types::{
    Answer, AssembledContext, Chunk, Language, QueryRequest, RetrievalHit, SourceRef,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "ragdesk";
