//! Confidence scoring from retrieval similarity
//!
//! A weighted average of clamped similarities; early hits dominate. Empty
//! retrieval scores 0.0, which is also how fallback answers are scored.

use crate::types::RetrievalHit;

/// Weights for the first hits; later hits get the floor weight
const HIT_WEIGHTS: [f32; 3] = [1.0, 0.7, 0.5];
const FLOOR_WEIGHT: f32 = 0.3;

/// Derives a [0, 1] confidence value from retrieval hits
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Weighted average of per-hit similarities, 0.0 for empty hits
    pub fn score(&self, hits: &[RetrievalHit]) -> f32 {
        if hits.is_empty() {
            return 0.0;
        }

        let mut weighted_sum = 0.0f32;
        let mut weight_total = 0.0f32;

        for (i, hit) in hits.iter().enumerate() {
            let similarity = (1.0 - hit.distance).clamp(0.0, 1.0);
            let weight = HIT_WEIGHTS.get(i).copied().unwrap_or(FLOOR_WEIGHT);
            weighted_sum += similarity * weight;
            weight_total += weight;
        }

        (weighted_sum / weight_total).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn hit(similarity: f32) -> RetrievalHit {
        RetrievalHit {
            chunk: Chunk {
                id: "c".to_string(),
                text: String::new(),
                source_file: "f".to_string(),
                chunk_index: 0,
                embedding: Vec::new(),
            },
            similarity,
            distance: 1.0 - similarity,
        }
    }

    #[test]
    fn test_empty_hits_score_zero() {
        assert_eq!(ConfidenceScorer::new().score(&[]), 0.0);
    }

    #[test]
    fn test_weighted_average_three_hits() {
        let scorer = ConfidenceScorer::new();
        let score = scorer.score(&[hit(0.89), hit(0.76), hit(0.6)]);
        let expected = (0.89 * 1.0 + 0.76 * 0.7 + 0.6 * 0.5) / (1.0 + 0.7 + 0.5);
        assert!((score - expected).abs() < 1e-5);
        assert!((score - 0.779).abs() < 0.005);
    }

    #[test]
    fn test_floor_weight_beyond_third_hit() {
        let scorer = ConfidenceScorer::new();
        let score = scorer.score(&[hit(1.0), hit(1.0), hit(1.0), hit(0.0)]);
        let expected = (1.0 + 0.7 + 0.5) / (1.0 + 0.7 + 0.5 + 0.3);
        assert!((score - expected).abs() < 1e-5);
    }

    #[test]
    fn test_score_in_unit_interval() {
        let scorer = ConfidenceScorer::new();
        // Distances outside [0,1] get clamped
        let mut wild = hit(0.5);
        wild.distance = -0.4;
        assert!(scorer.score(&[wild.clone()]) <= 1.0);
        wild.distance = 1.7;
        assert!(scorer.score(&[wild]) >= 0.0);
    }

    #[test]
    fn test_monotonic_in_top_similarity() {
        let scorer = ConfidenceScorer::new();
        let lower = scorer.score(&[hit(0.6), hit(0.5), hit(0.4)]);
        let higher = scorer.score(&[hit(0.8), hit(0.5), hit(0.4)]);
        assert!(higher > lower);
    }
}
