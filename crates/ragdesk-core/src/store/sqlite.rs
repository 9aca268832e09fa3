//! SQLite-backed vector store
//!
//! Chunks are ingested with their embeddings as little-endian f32 blobs;
//! search scans the requested collection and ranks by cosine similarity.
//! The connection mutex is internal so the adapter stays `Send + Sync`.

use super::{cosine_similarity, VectorStore};
use crate::error::{RagdeskError, Result};
use crate::types::{Chunk, RetrievalHit};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chunks (
    id          TEXT PRIMARY KEY,
    collection  TEXT NOT NULL,
    source_file TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    text        TEXT NOT NULL,
    embedding   BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
CREATE TABLE IF NOT EXISTS store_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Vector store over a local SQLite database
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`, recording `dimensions` in its
    /// metadata. Opening an existing store with different dimensions is a
    /// fatal configuration error.
    pub fn open(path: &Path, dimensions: usize) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn, dimensions)
    }

    /// In-memory store, used by tests and ingestion dry runs
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, dimensions)
    }

    fn initialize(conn: Connection, dimensions: usize) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'dimensions'",
                [],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match stored {
            Some(value) => {
                let existing: usize = value
                    .parse()
                    .map_err(|_| RagdeskError::Retrieval(format!("corrupt dimensions metadata: {}", value)))?;
                if existing != dimensions {
                    return Err(RagdeskError::Config(format!(
                        "store indexed with {} dimensions, configured for {}",
                        existing, dimensions
                    )));
                }
            }
            None => {
                conn.execute(
                    "INSERT INTO store_meta (key, value) VALUES ('dimensions', ?1)",
                    [dimensions.to_string()],
                )?;
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert pre-embedded chunks (ingestion-side callers and tests)
    pub fn insert_chunks(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let dimensions = self.dimensions()?;
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| RagdeskError::Retrieval("store lock poisoned".to_string()))?;

        let tx = conn.transaction()?;
        for chunk in chunks {
            if chunk.embedding.len() != dimensions {
                return Err(RagdeskError::Config(format!(
                    "chunk {} has {} dimensions, store expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    dimensions
                )));
            }
            tx.execute(
                "INSERT OR REPLACE INTO chunks (id, collection, source_file, chunk_index, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    chunk.id,
                    collection,
                    chunk.source_file,
                    chunk.chunk_index,
                    chunk.text,
                    embedding_to_bytes(&chunk.embedding),
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Number of chunks in a collection
    pub fn collection_size(&self, collection: &str) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RagdeskError::Retrieval("store lock poisoned".to_string()))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn search(
        &self,
        embedding: &[f32],
        top_n: usize,
        collection: &str,
    ) -> Result<Vec<RetrievalHit>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let conn = self
            .conn
            .lock()
            .map_err(|_| RagdeskError::Retrieval("store lock poisoned".to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, source_file, chunk_index, text, embedding
             FROM chunks WHERE collection = ?1",
        )?;

        let rows = stmt.query_map([collection], |row| {
            Ok(Chunk {
                id: row.get(0)?,
                source_file: row.get(1)?,
                chunk_index: row.get(2)?,
                text: row.get(3)?,
                embedding: bytes_to_embedding(&row.get::<_, Vec<u8>>(4)?),
            })
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let chunk = row?;
            let similarity = cosine_similarity(embedding, &chunk.embedding);
            hits.push(RetrievalHit {
                chunk,
                similarity,
                distance: 1.0 - similarity,
            });
        }

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_n);

        Ok(hits)
    }

    fn dimensions(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RagdeskError::Retrieval("store lock poisoned".to_string()))?;
        let value: String = conn.query_row(
            "SELECT value FROM store_meta WHERE key = 'dimensions'",
            [],
            |row| row.get(0),
        )?;
        value
            .parse()
            .map_err(|_| RagdeskError::Retrieval(format!("corrupt dimensions metadata: {}", value)))
    }
}

/// Serialize embedding as little-endian f32 bytes
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize little-endian f32 bytes back to an embedding
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, source: &str, index: i64, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("chunk {}", id),
            source_file: source.to_string(),
            chunk_index: index,
            embedding,
        }
    }

    #[test]
    fn test_embedding_roundtrip() {
        let original = vec![1.0f32, 2.0, 3.0, -1.5];
        let bytes = embedding_to_bytes(&original);
        let restored = bytes_to_embedding(&bytes);
        assert_eq!(original, restored);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = SqliteVectorStore::open_in_memory(3).unwrap();
        store
            .insert_chunks(
                "faq",
                &[
                    chunk("a", "doc.txt", 0, vec![1.0, 0.0, 0.0]),
                    chunk("b", "doc.txt", 1, vec![0.0, 1.0, 0.0]),
                    chunk("c", "doc.txt", 2, vec![0.7, 0.7, 0.0]),
                ],
            )
            .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 2, "faq").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "a");
        assert_eq!(hits[1].chunk.id, "c");
        assert!(hits[0].similarity >= hits[1].similarity);
    }

    #[tokio::test]
    async fn test_empty_collection_returns_empty() {
        let store = SqliteVectorStore::open_in_memory(3).unwrap();
        let hits = store.search(&[1.0, 0.0, 0.0], 5, "missing").await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_dimension_mismatch_on_insert() {
        let store = SqliteVectorStore::open_in_memory(3).unwrap();
        let result = store.insert_chunks("faq", &[chunk("a", "doc.txt", 0, vec![1.0, 0.0])]);
        assert!(matches!(result, Err(RagdeskError::Config(_))));
    }

    #[test]
    fn test_reopen_with_different_dimensions_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite");
        {
            SqliteVectorStore::open(&path, 384).unwrap();
        }
        let result = SqliteVectorStore::open(&path, 512);
        assert!(matches!(result, Err(RagdeskError::Config(_))));
    }
}
