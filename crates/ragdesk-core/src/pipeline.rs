//! Query orchestration
//!
//! Sequences one request through embed → retrieve → assemble → rate check →
//! generate → score → cache. Per-request state is local; only the response
//! cache and the rate limiter are shared, each behind its own lock.

use crate::cache::ResponseCache;
use crate::confidence::ConfidenceScorer;
use crate::config::Config;
use crate::context::ContextAssembler;
use crate::error::{RagdeskError, Result};
use crate::llm::{ChatClient, Embedder};
use crate::prompt::PromptBuilder;
use crate::ratelimit::RateLimiter;
use crate::store::VectorStore;
use crate::types::{Answer, AssembledContext, Language, QueryRequest, SourceRef};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum question length after trimming, in characters
const MIN_QUESTION_CHARS: usize = 3;

/// Upper bound on requested retrieval count
const MAX_RESULTS_LIMIT: usize = 10;

/// Orchestrates the full question-answering pipeline for one domain
pub struct QueryOrchestrator {
    embedders: HashMap<Language, Arc<dyn Embedder>>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatClient>,
    assembler: ContextAssembler,
    prompts: PromptBuilder,
    limiter: RateLimiter,
    scorer: ConfidenceScorer,
    cache: ResponseCache,
    collections: HashMap<Language, String>,
    overall_timeout: Duration,
}

impl QueryOrchestrator {
    /// Construct the pipeline, validating configuration and the
    /// embedder/store dimensionality agreement. A mismatch is fatal here
    /// rather than a per-request failure.
    pub fn new(
        config: &Config,
        embedders: HashMap<Language, Arc<dyn Embedder>>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatClient>,
    ) -> Result<Self> {
        config.validate()?;

        if embedders.is_empty() {
            return Err(RagdeskError::Config(
                "at least one embedder is required".to_string(),
            ));
        }

        let store_dims = store.dimensions()?;
        for (language, embedder) in &embedders {
            if embedder.dimensions() != store_dims {
                return Err(RagdeskError::Config(format!(
                    "{} embedder produces {} dimensions, store is indexed with {}",
                    language,
                    embedder.dimensions(),
                    store_dims
                )));
            }
        }

        let domain = config.active_domain_config()?;
        let prompts = PromptBuilder::new(&config.domains, &config.active_domain)?;

        Ok(Self {
            embedders,
            store,
            chat,
            assembler: ContextAssembler::new(config.pipeline.context_token_budget),
            prompts,
            limiter: RateLimiter::new(
                Duration::from_secs(config.pipeline.rate_limit_window_secs),
                config.pipeline.rate_limit_max_calls,
            ),
            scorer: ConfidenceScorer::new(),
            cache: ResponseCache::new(config.pipeline.cache_capacity),
            collections: domain.collections.clone(),
            overall_timeout: Duration::from_secs(config.pipeline.overall_timeout_secs),
        })
    }

    /// Answer one question. The whole run is bounded by the configured
    /// deadline; on expiry partial work is discarded, not cached.
    pub async fn ask(&self, request: QueryRequest) -> Result<Answer> {
        tokio::time::timeout(self.overall_timeout, self.run(request))
            .await
            .map_err(|_| RagdeskError::Timeout)?
    }

    async fn run(&self, request: QueryRequest) -> Result<Answer> {
        let start = Instant::now();

        let question = self.validate(&request)?;
        let language = request.language;

        if let Some(cached) = self.cache.get(&question, language) {
            tracing::debug!("cache hit for question");
            return Ok(Answer {
                processing_time_ms: start.elapsed().as_millis() as u64,
                ..cached
            });
        }

        tracing::debug!("embedding question");
        let embedder = self.embedder_for(language)?;
        let embedding = embedder.embed(&question).await?;

        let collection = self.collection_for(language)?;
        tracing::debug!("searching collection {}", collection);
        let hits = self
            .store
            .search(&embedding, request.max_results, collection)
            .await?;
        tracing::debug!("retrieved {} hits", hits.len());

        let context = self.assembler.assemble(&hits);

        if !self.limiter.admit() {
            tracing::warn!("rate limit exceeded, rejecting request");
            return Err(RagdeskError::RateLimitExceeded);
        }

        let prompt = self.prompts.build(&context.text, &question, language);
        let (text, fallback_used) = match self.chat.chat(&prompt.system, &prompt.user).await {
            Ok(text) => (text, false),
            Err(e) if is_generation_failure(&e) => {
                tracing::warn!("generation failed after retries: {}, trying no-context fallback", e);
                let fallback_prompt = self.prompts.build("", &question, language);
                let text = self
                    .chat
                    .chat(&fallback_prompt.system, &fallback_prompt.user)
                    .await?;
                (text, true)
            }
            Err(e) => return Err(e),
        };

        // Fallback answers carry no retrieval backing, so they score zero
        // and are not worth caching.
        let scored_context = if fallback_used {
            AssembledContext::empty()
        } else {
            context
        };

        let answer = Answer {
            text,
            sources: scored_context
                .source_hits
                .iter()
                .map(|hit| SourceRef {
                    source_file: hit.chunk.source_file.clone(),
                    chunk_index: hit.chunk.chunk_index,
                    similarity_score: hit.similarity,
                })
                .collect(),
            confidence: self.scorer.score(&scored_context.source_hits),
            model_used: self.chat.model_name().to_string(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            fallback_used,
        };

        if !fallback_used {
            self.cache.put(&question, language, answer.clone());
        }

        tracing::info!(
            "answered in {}ms (confidence {:.3}, fallback: {})",
            answer.processing_time_ms,
            answer.confidence,
            answer.fallback_used
        );

        Ok(answer)
    }

    /// Validate the request before any downstream call is made
    fn validate(&self, request: &QueryRequest) -> Result<String> {
        let question = request.question.trim().to_string();
        if question.chars().count() < MIN_QUESTION_CHARS {
            return Err(RagdeskError::Validation(format!(
                "question must be at least {} characters",
                MIN_QUESTION_CHARS
            )));
        }
        if request.max_results == 0 || request.max_results > MAX_RESULTS_LIMIT {
            return Err(RagdeskError::Validation(format!(
                "max_results must be in 1..={}",
                MAX_RESULTS_LIMIT
            )));
        }
        if !self.collections.contains_key(&request.language) {
            return Err(RagdeskError::Validation(format!(
                "language {} is not served by this domain",
                request.language
            )));
        }
        Ok(question)
    }

    fn embedder_for(&self, language: Language) -> Result<&Arc<dyn Embedder>> {
        self.embedders
            .get(&language)
            .or_else(|| self.embedders.get(&Language::En))
            .ok_or_else(|| {
                RagdeskError::Config(format!("no embedder configured for {}", language))
            })
    }

    fn collection_for(&self, language: Language) -> Result<&str> {
        self.collections
            .get(&language)
            .map(String::as_str)
            .ok_or_else(|| {
                RagdeskError::Validation(format!(
                    "language {} is not served by this domain",
                    language
                ))
            })
    }

    /// Cache size, exposed for operational visibility
    pub fn cached_answers(&self) -> usize {
        self.cache.len()
    }

    /// LLM calls currently inside the rate window
    pub fn rate_window_count(&self) -> usize {
        self.limiter.current_count()
    }
}

/// Errors that escalate to the one-shot no-context fallback: the LLM failure
/// taxonomy, after the client's own retry policy is exhausted.
fn is_generation_failure(error: &RagdeskError) -> bool {
    matches!(
        error,
        RagdeskError::LlmTimeout
            | RagdeskError::LlmHttp { .. }
            | RagdeskError::LlmMalformed(_)
            | RagdeskError::Http(_)
    )
}
