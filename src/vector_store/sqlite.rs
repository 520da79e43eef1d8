//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For production use cases with large datasets, consider using sqlite-vec extension
//! or a dedicated vector database.

use super::{cosine_similarity, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{DocentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        source_file TEXT NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        chunk_order INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_source_file ON documents(source_file);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DocentError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(3)?;
        let indexed_at_str: String = row.get(5)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            source_file: row.get(1)?,
            content: row.get(2)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(4)?,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc))]
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;

        let embedding_bytes = Self::embedding_to_bytes(&doc.embedding);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO documents
            (id, source_file, content, embedding, chunk_order, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doc.id.to_string(),
                doc.source_file,
                doc.content,
                embedding_bytes,
                doc.chunk_order,
                doc.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted document {}", doc.id);
        Ok(())
    }

    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;

        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            let embedding_bytes = Self::embedding_to_bytes(&doc.embedding);

            tx.execute(
                r#"
                INSERT OR REPLACE INTO documents
                (id, source_file, content, embedding, chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    doc.id.to_string(),
                    doc.source_file,
                    doc.content,
                    embedding_bytes,
                    doc.chunk_order,
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source_file, content, embedding, chunk_order, indexed_at
            FROM documents
            "#,
        )?;

        let docs = stmt.query_map([], Self::row_to_document)?;

        let mut results: Vec<SearchResult> = docs
            .filter_map(|doc_result| doc_result.ok())
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult {
                    document: doc,
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source_file: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM documents WHERE source_file = ?1",
            params![source_file],
        )?;

        info!("Deleted {} documents for source {}", deleted, source_file);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_file, COUNT(*) as chunk_count, MAX(indexed_at) as indexed_at
            FROM documents
            GROUP BY source_file
            ORDER BY source_file
            "#,
        )?;

        let sources = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(2)?;
            Ok(IndexedSource {
                source_file: row.get(0)?,
                chunk_count: row.get(1)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let result: Vec<IndexedSource> = sources.filter_map(|s| s.ok()).collect();
        Ok(result)
    }

    async fn is_source_indexed(&self, source_file: &str) -> Result<bool> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE source_file = ?1",
            params![source_file],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let doc = Document::new(
            "ch3.txt".to_string(),
            "Stocks accumulate their inflows.".to_string(),
            vec![1.0, 0.0, 0.0],
            0,
        );

        store.upsert(&doc).await.unwrap();

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_file, "ch3.txt");

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.content, doc.content);

        let deleted = store.delete_by_source("ch3.txt").await.unwrap();
        assert_eq!(deleted, 1);

        let sources = store.list_sources().await.unwrap();
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_threshold_filters_low_scores() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert_batch(&[
                Document::new("a.txt".to_string(), "near".to_string(), vec![1.0, 0.0], 0),
                Document::new("b.txt".to_string(), "far".to_string(), vec![0.0, 1.0], 0),
            ])
            .await
            .unwrap();

        let results = store
            .search_with_threshold(&[1.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.source_file, "a.txt");
    }

    #[tokio::test]
    async fn test_embedding_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store
                .upsert(&Document::new(
                    "ch5.txt".to_string(),
                    "Delays create oscillation.".to_string(),
                    vec![0.25, -0.5, 0.125],
                    0,
                ))
                .await
                .unwrap();
        }

        // Reopen from disk and verify the embedding survived byte-for-byte.
        let store = SqliteVectorStore::new(&path).unwrap();
        let results = store.search(&[0.25, -0.5, 0.125], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.embedding, vec![0.25, -0.5, 0.125]);
    }

    #[tokio::test]
    async fn test_is_source_indexed() {
        let store = SqliteVectorStore::in_memory().unwrap();
        assert!(!store.is_source_indexed("ch3.txt").await.unwrap());

        store
            .upsert(&Document::new(
                "ch3.txt".to_string(),
                "content".to_string(),
                vec![1.0],
                0,
            ))
            .await
            .unwrap();

        assert!(store.is_source_indexed("ch3.txt").await.unwrap());
        assert_eq!(store.document_count().await.unwrap(), 1);
    }
}
