//! Embedding generation for course-material retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Turns text into vectors for similarity search over the course index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query or chunk.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of chunks, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}
