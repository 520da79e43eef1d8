//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{DocentError, Result};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
///
/// The client is injected so the credential stays a bootstrap concern.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create a new embedder over an existing client.
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DocentError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // OpenAI has a limit on batch size, process in chunks
        const BATCH_SIZE: usize = 100;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let input: Vec<String> = chunk.to_vec();

            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(input))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| DocentError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| DocentError::OpenAI(format!("Embedding API error: {}", e)))?;

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            for embedding_data in embeddings {
                all_embeddings.push(embedding_data.embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::create_client_with_config;
    use async_openai::config::OpenAIConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_client(server: &MockServer) -> async_openai::Client<OpenAIConfig> {
        create_client_with_config(
            OpenAIConfig::new()
                .with_api_base(server.uri())
                .with_api_key("test-key"),
        )
    }

    #[test]
    fn test_dimensions_passthrough() {
        let embedder = OpenAIEmbedder::new(
            async_openai::Client::with_config(OpenAIConfig::new()),
            "text-embedding-3-large",
            3072,
        );
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[tokio::test]
    async fn test_embed_batch_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "model": "text-embedding-3-small",
                "data": [
                    {"index": 1, "object": "embedding", "embedding": [0.4, 0.5]},
                    {"index": 0, "object": "embedding", "embedding": [0.1, 0.2]}
                ],
                "usage": {"prompt_tokens": 4, "total_tokens": 4}
            })))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::new(mock_client(&server), "text-embedding-3-small", 2);
        let embeddings = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings, vec![vec![0.1, 0.2], vec![0.4, 0.5]]);
    }

    #[tokio::test]
    async fn test_embed_empty_input_skips_api() {
        // No mock mounted: any request would fail the test.
        let server = MockServer::start().await;
        let embedder = OpenAIEmbedder::new(mock_client(&server), "text-embedding-3-small", 2);

        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::new(mock_client(&server), "text-embedding-3-small", 2);
        let err = embedder.embed("question").await.unwrap_err();
        assert!(matches!(err, DocentError::OpenAI(_)));
    }
}
