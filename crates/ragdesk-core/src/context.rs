//! Context assembly
//!
//! Turns retrieval hits into a single token-bounded context block with
//! provenance. Chunks are joined similarity-descending and the budget is
//! enforced at the chunk-join boundary; only a single oversized leading
//! chunk gets token-level truncation.

use crate::tokens::{count_tokens, truncate_to_tokens};
use crate::types::{AssembledContext, RetrievalHit};
use std::collections::HashSet;

/// Separator between joined chunks
const CHUNK_SEPARATOR: &str = "\n\n";

/// Word-overlap ratio above which two adjacent chunks count as duplicates
const DEDUP_OVERLAP_THRESHOLD: f64 = 0.8;

/// Assembles retrieval hits into a token-bounded context
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    token_budget: usize,
}

impl ContextAssembler {
    pub fn new(token_budget: usize) -> Self {
        Self { token_budget }
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Build a context from hits, never exceeding the configured budget.
    /// Empty hits produce an empty context; downstream prompt construction
    /// degrades to no-context mode.
    pub fn assemble(&self, hits: &[RetrievalHit]) -> AssembledContext {
        let deduped = dedup_hits(hits);
        if deduped.is_empty() {
            return AssembledContext::empty();
        }

        let mut text = String::new();
        let mut token_count = 0usize;
        let mut included = Vec::new();

        for hit in deduped {
            // Token counts are not additive across a join, so the joined
            // candidate is recounted as a whole before committing.
            let candidate = if included.is_empty() {
                hit.chunk.text.clone()
            } else {
                format!("{}{}{}", text, CHUNK_SEPARATOR, hit.chunk.text)
            };
            let candidate_tokens = count_tokens(&candidate);

            if candidate_tokens <= self.token_budget {
                text = candidate;
                token_count = candidate_tokens;
                included.push(hit);
                continue;
            }

            // A single oversized leading chunk is cut at the token boundary
            // equal to the budget; later chunks are simply not added.
            if included.is_empty() {
                let truncated = truncate_to_tokens(&hit.chunk.text, self.token_budget);
                token_count = count_tokens(&truncated);
                text = truncated;
                included.push(hit);
            }
            break;
        }

        tracing::debug!(
            "Assembled context: {} chunks, {} tokens (budget {})",
            included.len(),
            token_count,
            self.token_budget
        );

        AssembledContext {
            text,
            token_count,
            source_hits: included,
        }
    }
}

/// Drop near-identical hits: same source file, same or adjacent chunk index,
/// high word overlap. Input is similarity-descending, so keeping the first
/// occurrence keeps the higher-similarity one.
fn dedup_hits(hits: &[RetrievalHit]) -> Vec<RetrievalHit> {
    let mut kept: Vec<RetrievalHit> = Vec::with_capacity(hits.len());

    for hit in hits {
        let duplicate = kept.iter().any(|existing| {
            existing.chunk.source_file == hit.chunk.source_file
                && (existing.chunk.chunk_index - hit.chunk.chunk_index).abs() <= 1
                && word_overlap(&existing.chunk.text, &hit.chunk.text) >= DEDUP_OVERLAP_THRESHOLD
        });
        if !duplicate {
            kept.push(hit.clone());
        }
    }

    kept
}

/// Jaccard overlap of word sets
fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn hit(text: &str, source: &str, index: i64, similarity: f32) -> RetrievalHit {
        RetrievalHit {
            chunk: Chunk {
                id: format!("{}:{}", source, index),
                text: text.to_string(),
                source_file: source.to_string(),
                chunk_index: index,
                embedding: Vec::new(),
            },
            similarity,
            distance: 1.0 - similarity,
        }
    }

    #[test]
    fn test_empty_hits_empty_context() {
        let assembler = ContextAssembler::new(3000);
        let ctx = assembler.assemble(&[]);
        assert!(ctx.is_empty());
        assert_eq!(ctx.token_count, 0);
        assert!(ctx.source_hits.is_empty());
    }

    #[test]
    fn test_joins_with_blank_line() {
        let assembler = ContextAssembler::new(3000);
        let hits = vec![
            hit("Travel must be approved in advance.", "policy.txt", 0, 0.9),
            hit("Per diem covers meals and lodging.", "policy.txt", 5, 0.8),
        ];
        let ctx = assembler.assemble(&hits);
        assert_eq!(
            ctx.text,
            "Travel must be approved in advance.\n\nPer diem covers meals and lodging."
        );
        assert_eq!(ctx.source_hits.len(), 2);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let long = "word ".repeat(200);
        let hits = vec![
            hit(&long, "a.txt", 0, 0.9),
            hit(&long, "b.txt", 0, 0.8),
            hit(&long, "c.txt", 0, 0.7),
        ];
        for budget in [10usize, 50, 150, 300, 1000] {
            let assembler = ContextAssembler::new(budget);
            let ctx = assembler.assemble(&hits);
            assert!(
                ctx.token_count <= budget,
                "budget {} exceeded with {} tokens",
                budget,
                ctx.token_count
            );
            assert_eq!(ctx.token_count, count_tokens(&ctx.text));
        }
    }

    #[test]
    fn test_oversized_first_chunk_truncated() {
        let long = "alpha beta gamma delta ".repeat(100);
        let assembler = ContextAssembler::new(20);
        let ctx = assembler.assemble(&[hit(&long, "a.txt", 0, 0.9)]);
        assert!(!ctx.is_empty());
        assert!(ctx.token_count <= 20);
        assert_eq!(ctx.source_hits.len(), 1);
    }

    #[test]
    fn test_stops_at_chunk_boundary() {
        let medium = "word ".repeat(30);
        let assembler = ContextAssembler::new(40);
        let hits = vec![
            hit(&medium, "a.txt", 0, 0.9),
            hit(&medium, "b.txt", 0, 0.8),
        ];
        let ctx = assembler.assemble(&hits);
        // Second chunk would overflow, so only the first is included whole
        assert_eq!(ctx.source_hits.len(), 1);
        assert_eq!(ctx.text.trim_end(), medium.trim_end());
    }

    #[test]
    fn test_dedup_keeps_higher_similarity() {
        let text = "Merchants can reset their PIN from the app settings menu.";
        let hits = vec![
            hit(text, "faq.txt", 3, 0.9),
            hit(text, "faq.txt", 4, 0.7),
            hit("Unrelated refund policy text entirely different.", "faq.txt", 9, 0.6),
        ];
        let assembler = ContextAssembler::new(3000);
        let ctx = assembler.assemble(&hits);
        assert_eq!(ctx.source_hits.len(), 2);
        assert_eq!(ctx.source_hits[0].similarity, 0.9);
    }

    #[test]
    fn test_distant_chunks_not_deduped() {
        let text = "Merchants can reset their PIN from the app settings menu.";
        let hits = vec![hit(text, "faq.txt", 0, 0.9), hit(text, "faq.txt", 10, 0.7)];
        let assembler = ContextAssembler::new(3000);
        let ctx = assembler.assemble(&hits);
        assert_eq!(ctx.source_hits.len(), 2);
    }

    #[test]
    fn test_word_overlap() {
        assert!((word_overlap("a b c", "a b c") - 1.0).abs() < f64::EPSILON);
        assert_eq!(word_overlap("a b", "c d"), 0.0);
        assert_eq!(word_overlap("", "a"), 0.0);
    }
}
