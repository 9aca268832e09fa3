//! HTTP client for external LLM services (OpenRouter, vLLM, OpenAI, etc.)

use crate::config::LlmServiceConfig;
use crate::error::{RagdeskError, Result};
use crate::llm::ChatClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{atomic::AtomicU64, Arc};
use std::time::{Duration, Instant};

/// Retries after the first attempt, on timeout or 5xx only
const MAX_RETRIES: u32 = 2;

/// Exponential backoff schedule in seconds (1s, 2s)
fn backoff_for_attempt(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt)
}

/// Drive one call through the retry policy: at most `MAX_RETRIES` retries
/// with exponential backoff, and only for retryable failures. Everything
/// else propagates on the first attempt.
async fn call_with_retry<T, F, Fut>(mut call: F, metrics: &ApiMetrics) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use std::sync::atomic::Ordering;

    let mut attempt = 0u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                let backoff = backoff_for_attempt(attempt);
                tracing::warn!(
                    "LLM call failed (attempt {}/{}): {}, retrying in {:?}",
                    attempt + 1,
                    MAX_RETRIES + 1,
                    e,
                    backoff
                );
                metrics.total_retries.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct ApiMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub total_retries: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub total_retries: u64,
    pub avg_latency_ms: f64,
}

/// OpenRouter/OpenAI-compatible chat completion client
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    config: LlmServiceConfig,
    metrics: Arc<ApiMetrics>,
}

impl OpenRouterClient {
    /// Create new client from configuration
    pub fn new(config: LlmServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RagdeskError::Http)?;

        Ok(Self {
            http_client,
            config,
            metrics: Arc::new(ApiMetrics::default()),
        })
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        use std::sync::atomic::Ordering;

        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            total_retries: self.metrics.total_retries.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// One completion attempt, no retry
    async fn chat_once(&self, messages: &[ChatMessage]) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut req = self
            .http_client
            .post(&self.config.url)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
            .json(&request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req.send().await.map_err(|e| {
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

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagdeskError::LlmMalformed(format!("invalid response body: {}", e)))?;

        let content = chat_response
            .choices
            .first()
            .ok_or_else(|| RagdeskError::LlmMalformed("no choices in response".to_string()))?
            .message
            .content
            .trim()
            .to_string();

        Ok(content)
    }
}

#[async_trait]
impl ChatClient for OpenRouterClient {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        use std::sync::atomic::Ordering;

        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];

        let result = call_with_retry(|| self.chat_once(&messages), &self.metrics).await;

        if result.is_err() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
        }

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        result
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
