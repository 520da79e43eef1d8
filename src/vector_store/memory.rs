//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{DocentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Document>>> {
        self.documents
            .read()
            .map_err(|e| DocentError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Document>>> {
        self.documents
            .write()
            .map_err(|e| DocentError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let mut docs = self.write()?;
        docs.insert(doc.id.to_string(), doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.id.to_string(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;

        let mut results: Vec<SearchResult> = docs
            .values()
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult {
                    document: doc.clone(),
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn delete_by_source(&self, source_file: &str) -> Result<usize> {
        let mut docs = self.write()?;
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.source_file != source_file);
        Ok(initial_len - docs.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let docs = self.read()?;

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();

        for doc in docs.values() {
            let entry = source_map
                .entry(doc.source_file.clone())
                .or_insert_with(|| IndexedSource {
                    source_file: doc.source_file.clone(),
                    chunk_count: 0,
                    indexed_at: doc.indexed_at,
                });

            entry.chunk_count += 1;
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| a.source_file.cmp(&b.source_file));

        Ok(sources)
    }

    async fn is_source_indexed(&self, source_file: &str) -> Result<bool> {
        let docs = self.read()?;
        Ok(docs.values().any(|d| d.source_file == source_file))
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.read()?;
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let doc1 = Document::new(
            "ch3.txt".to_string(),
            "Feedback loops drive behavior".to_string(),
            vec![1.0, 0.0, 0.0],
            0,
        );

        let doc2 = Document::new(
            "ch3.txt".to_string(),
            "Stocks integrate flows".to_string(),
            vec![0.0, 1.0, 0.0],
            1,
        );

        store.upsert_batch(&[doc1, doc2]).await.unwrap();

        assert_eq!(store.document_count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 2);
    }

    #[tokio::test]
    async fn test_delete_by_source() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                Document::new("ch3.txt".to_string(), "a".to_string(), vec![1.0], 0),
                Document::new("ch5.txt".to_string(), "b".to_string(), vec![1.0], 0),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_by_source("ch3.txt").await.unwrap(), 1);
        assert!(!store.is_source_indexed("ch3.txt").await.unwrap());
        assert!(store.is_source_indexed("ch5.txt").await.unwrap());
    }
}
