//! Core data model for the query-answering pipeline

use crate::error::RagdeskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported answer languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "bn")]
    Bn,
}

impl Language {
    /// Language code as sent to the LLM ("en" / "bn")
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = RagdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "bn" => Ok(Language::Bn),
            other => Err(RagdeskError::Validation(format!(
                "unsupported language: {}",
                other
            ))),
        }
    }
}

/// A pre-embedded segment of source text, owned by the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source_file: String,
    pub chunk_index: i64,
    pub embedding: Vec<f32>,
}

/// One incoming question, created per call and discarded after answering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_language")]
    pub language: Language,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_language() -> Language {
    Language::En
}

fn default_max_results() -> usize {
    3
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, language: Language) -> Self {
        Self {
            question: question.into(),
            language,
            max_results: default_max_results(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// A chunk returned by similarity search, with its scores
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    /// Cosine similarity, higher is closer
    pub similarity: f32,
    /// `1.0 - similarity`, kept for callers that think in distances
    pub distance: f32,
}

/// Token-bounded context string with provenance
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub token_count: usize,
    pub source_hits: Vec<RetrievalHit>,
}

impl AssembledContext {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            token_count: 0,
            source_hits: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Provenance for one chunk that backed an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_file: String,
    pub chunk_index: i64,
    pub similarity_score: f32,
}

/// Final pipeline output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceRef>,
    /// Retrieval-quality scalar in [0, 1]; 0.0 when no hits backed the answer
    pub confidence: f32,
    pub model_used: String,
    pub processing_time_ms: u64,
    pub fallback_used: bool,
}
