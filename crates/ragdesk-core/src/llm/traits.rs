//! LLM trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
///
/// Implementations must be deterministic for identical input and safe for
/// concurrent use; any model mutex lives inside the implementation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts; must agree with `embed`
    /// for each individual text
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Chat completion trait
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Generate a completion for a system/user prompt pair
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Get model name
    fn model_name(&self) -> &str;
}
