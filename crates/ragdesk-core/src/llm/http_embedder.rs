//! HTTP-based embedder using an external embeddings service

use crate::config::EmbeddingConfig;
use crate::error::{RagdeskError, Result};
use crate::llm::Embedder;
use crate::types::Language;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BATCH_SIZE: usize = 32;
const DEFAULT_CONCURRENT: usize = 4;

/// Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint
pub struct HttpEmbedder {
    http_client: reqwest::Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(url: String, model: String, dimensions: usize, timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(RagdeskError::Http)?;

        Ok(Self {
            http_client,
            url,
            model,
            dimensions,
        })
    }

    /// Create from configuration for a given language; per-language models
    /// keep bn/en questions in the vector space their collection was
    /// indexed with
    pub fn from_config(config: &EmbeddingConfig, language: Language) -> Result<Self> {
        let model = config.model_for(language).ok_or_else(|| {
            RagdeskError::Config(format!("no embedding model configured for {}", language))
        })?;
        Self::new(
            config.url.clone(),
            model.to_string(),
            config.dimensions,
            config.timeout_secs,
        )
    }

    /// Embed texts in parallel with multiple concurrent sub-batches
    ///
    /// Useful for ingestion-side callers embedding whole collections.
    pub async fn embed_batch_parallel(
        &self,
        texts: &[String],
        batch_size: usize,
        max_concurrent: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let chunk_size = if batch_size > 0 {
            batch_size
        } else {
            DEFAULT_BATCH_SIZE
        };
        let concurrent = if max_concurrent > 0 {
            max_concurrent
        } else {
            DEFAULT_CONCURRENT
        };

        let chunks: Vec<_> = texts.chunks(chunk_size).collect();
        let total_chunks = chunks.len();

        tracing::debug!(
            "Embedding {} texts in {} batches ({} concurrent)",
            texts.len(),
            total_chunks,
            concurrent
        );

        let results: Vec<_> = stream::iter(chunks)
            .enumerate()
            .map(|(idx, chunk)| async move {
                let result = self.embed_batch(chunk).await;
                (idx, result)
            })
            .buffer_unordered(concurrent)
            .collect()
            .await;

        let mut sorted_results: Vec<_> = results;
        sorted_results.sort_by_key(|(idx, _)| *idx);

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for (_, result) in sorted_results {
            all_embeddings.extend(result?);
        }

        Ok(all_embeddings)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let results = self.embed_batch(&texts).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagdeskError::LlmMalformed("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let url = format!("{}/v1/embeddings", self.url);
        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagdeskError::LlmTimeout
                } else {
                    RagdeskError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RagdeskError::LlmHttp { status, body });
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagdeskError::LlmMalformed(format!("invalid embedding body: {}", e)))?;

        if embed_response.data.len() != texts.len() {
            return Err(RagdeskError::LlmMalformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embed_response.data.len()
            )));
        }

        let embeddings: Vec<Vec<f32>> = embed_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect();

        for embedding in &embeddings {
            if embedding.len() != self.dimensions {
                return Err(RagdeskError::LlmMalformed(format!(
                    "embedding dimension {} does not match configured {}",
                    embedding.len(),
                    self.dimensions
                )));
            }
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
