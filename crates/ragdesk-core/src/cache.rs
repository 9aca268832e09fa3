//! Response caching to avoid repeat LLM calls
//!
//! Keys are the normalized question plus language. Capacity is bounded with
//! FIFO eviction by insertion order; access does not refresh recency, so
//! this is deliberately not an LRU. Entries survive corpus re-ingestion;
//! staleness is an accepted tradeoff.

use crate::types::{Answer, Language};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// Cached answer with insertion timestamp
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub answer: Answer,
    pub inserted_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
}

/// Bounded in-memory answer cache
pub struct ResponseCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Lookup a cached answer. Lock failures degrade to a miss.
    pub fn get(&self, question: &str, language: Language) -> Option<Answer> {
        let key = cache_key(question, language);
        let inner = self.inner.read().ok()?;
        inner.entries.get(&key).map(|entry| entry.answer.clone())
    }

    /// Store an answer, evicting the oldest inserted entry on overflow.
    /// A failed write is logged and otherwise ignored; the cache never
    /// blocks the pipeline.
    pub fn put(&self, question: &str, language: Language, answer: Answer) {
        let key = cache_key(question, language);
        let mut inner = match self.inner.write() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("response cache lock poisoned, dropping entry");
                return;
            }
        };

        if inner.entries.insert(
            key.clone(),
            CacheEntry {
                answer,
                inserted_at: Utc::now(),
            },
        ).is_none()
        {
            inner.insertion_order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            match inner.insertion_order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    tracing::debug!("response cache full, evicted oldest entry");
                }
                None => break,
            }
        }
    }

    /// Current entry count
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.entries.clear();
            inner.insertion_order.clear();
        }
    }
}

/// Normalized cache key: lowercased, trimmed question plus language tag
fn cache_key(question: &str, language: Language) -> String {
    format!("{}:{}", language.code(), question.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> Answer {
        Answer {
            text: text.to_string(),
            sources: Vec::new(),
            confidence: 0.5,
            model_used: "test".to_string(),
            processing_time_ms: 100,
            fallback_used: false,
        }
    }

    #[test]
    fn test_basic_get_put() {
        let cache = ResponseCache::new(10);
        cache.put("What is the travel policy?", Language::En, answer("a"));

        let hit = cache.get("What is the travel policy?", Language::En);
        assert_eq!(hit.unwrap().text, "a");
        assert!(cache.get("Other question", Language::En).is_none());
    }

    #[test]
    fn test_key_normalization() {
        let cache = ResponseCache::new(10);
        cache.put("  What Is The Travel Policy?  ", Language::En, answer("a"));
        assert!(cache.get("what is the travel policy?", Language::En).is_some());
    }

    #[test]
    fn test_language_separates_keys() {
        let cache = ResponseCache::new(10);
        cache.put("question", Language::En, answer("english"));
        cache.put("question", Language::Bn, answer("bangla"));
        assert_eq!(cache.get("question", Language::En).unwrap().text, "english");
        assert_eq!(cache.get("question", Language::Bn).unwrap().text, "bangla");
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = ResponseCache::new(3);
        cache.put("q1", Language::En, answer("a1"));
        cache.put("q2", Language::En, answer("a2"));
        cache.put("q3", Language::En, answer("a3"));
        cache.put("q4", Language::En, answer("a4"));

        assert_eq!(cache.len(), 3);
        // Oldest inserted entry evicted, regardless of access
        assert!(cache.get("q1", Language::En).is_none());
        assert!(cache.get("q2", Language::En).is_some());
        assert!(cache.get("q4", Language::En).is_some());
    }

    #[test]
    fn test_access_does_not_refresh_recency() {
        let cache = ResponseCache::new(2);
        cache.put("q1", Language::En, answer("a1"));
        cache.put("q2", Language::En, answer("a2"));

        // Touch q1, then overflow; q1 is still the one evicted
        assert!(cache.get("q1", Language::En).is_some());
        cache.put("q3", Language::En, answer("a3"));

        assert!(cache.get("q1", Language::En).is_none());
        assert!(cache.get("q2", Language::En).is_some());
    }

    #[test]
    fn test_overwrite_does_not_grow_order() {
        let cache = ResponseCache::new(2);
        cache.put("q1", Language::En, answer("a1"));
        cache.put("q1", Language::En, answer("updated"));
        cache.put("q2", Language::En, answer("a2"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("q1", Language::En).unwrap().text, "updated");
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let cache = ResponseCache::new(5);
        for i in 0..50 {
            cache.put(&format!("q{}", i), Language::En, answer("a"));
            assert!(cache.len() <= 5);
        }
    }
}
