//! Context building for tutor responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;

/// Builds retrieval context for a question.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 10,
            min_score: 0.3,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        // Generate query embedding
        let query_embedding = self.embedder.embed(query).await?;

        // Search for relevant documents
        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, self.max_chunks, self.min_score)
            .await?;

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Format context chunks for injection into a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!("---\n[{}] {}\n{}\n---", i + 1, chunk.source_file, chunk.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
