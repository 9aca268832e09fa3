//! LLM integration
//!
//! Provides traits and implementations for:
//! - Chat completions via external services (OpenRouter, vLLM, OpenAI, etc.)
//! - Question/document embedding generation

mod client;
mod http_embedder;
mod traits;

pub use client::{ApiMetrics, ChatMessage, MetricsSnapshot, OpenRouterClient};
pub use http_embedder::HttpEmbedder;
pub use traits::{ChatClient, Embedder};
