//! Vector store adapter
//!
//! The corpus is ingested out of band; the pipeline only performs
//! k-nearest-neighbor search over named collections.

mod sqlite;

pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use crate::types::RetrievalHit;
use async_trait::async_trait;

/// Interface to the external chunk store
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return at most `top_n` hits for `embedding` in `collection`, sorted
    /// by similarity descending. A sparse or empty collection yields fewer
    /// hits (possibly none), never an error.
    async fn search(
        &self,
        embedding: &[f32],
        top_n: usize,
        collection: &str,
    ) -> Result<Vec<RetrievalHit>>;

    /// Indexed vector dimensionality, checked against the embedder at
    /// orchestrator construction
    fn dimensions(&self) -> Result<usize>;
}

/// Cosine similarity between two vectors; 0.0 on length mismatch or zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }
}
