//! Context-mode chat engine.
//!
//! Retrieves course excerpts for each message, injects them into the turn,
//! and carries a token-bounded memory of the conversation.

use super::{context::format_context_for_prompt, ChatMemoryBuffer, ChatRole, ContextBuilder, ContextChunk};
use crate::config::Prompts;
use crate::error::{DocentError, Result};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// One engine turn: the answer and the excerpts that grounded it.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
}

/// Trait for conversational engines.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Run one conversational turn.
    async fn chat(&mut self, message: &str) -> Result<EngineResponse>;

    /// Drop all conversational state.
    fn reset(&mut self);
}

/// Chat engine that grounds every turn in retrieved course context.
pub struct ContextChatEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    system_prompt: String,
    context_template: String,
    context_builder: ContextBuilder,
    memory: ChatMemoryBuffer,
    temperature: f32,
}

impl ContextChatEngine {
    /// Create a new engine.
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        system_prompt: String,
        context_template: String,
        context_builder: ContextBuilder,
        memory: ChatMemoryBuffer,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            system_prompt,
            context_template,
            context_builder,
            memory,
            temperature: 0.7,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Compose the outgoing user content, injecting retrieved context.
    fn compose_user_content(&self, message: &str, chunks: &[ContextChunk]) -> String {
        if chunks.is_empty() {
            return message.to_string();
        }

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(chunks));
        vars.insert("question".to_string(), message.to_string());
        Prompts::render(&self.context_template, &vars)
    }

    /// Assemble system prompt, memory window, and the current message.
    fn build_messages(&self, user_content: String) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| DocentError::Chat(e.to_string()))?
                .into(),
        ];

        for (role, content) in self.memory.window() {
            let message: ChatCompletionRequestMessage = match role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(content.to_string())
                    .build()
                    .map_err(|e| DocentError::Chat(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content.to_string())
                    .build()
                    .map_err(|e| DocentError::Chat(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_content)
                .build()
                .map_err(|e| DocentError::Chat(e.to_string()))?
                .into(),
        );

        Ok(messages)
    }
}

#[async_trait]
impl ChatEngine for ContextChatEngine {
    #[instrument(skip(self, message))]
    async fn chat(&mut self, message: &str) -> Result<EngineResponse> {
        info!("Chat turn ({} remembered turns)", self.memory.len());

        // Build context from the course index
        let context_chunks = self.context_builder.build(message).await?;
        debug!("Retrieved {} context chunks", context_chunks.len());

        let user_content = self.compose_user_content(message, &context_chunks);
        let messages = self.build_messages(user_content)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| DocentError::Chat(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DocentError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| DocentError::Chat("Empty response from LLM".to_string()))?
            .clone();

        // Memory keeps the raw exchange; stale retrieval context stays out of it.
        self.memory.push(ChatRole::User, message);
        self.memory.push(ChatRole::Assistant, answer.clone());

        Ok(EngineResponse {
            answer,
            sources: context_chunks,
        })
    }

    fn reset(&mut self) {
        self.memory.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::openai::create_client_with_config;
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
    use async_openai::config::OpenAIConfig;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    fn completion_body(answer: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": answer},
                "finish_reason": "stop"
            }]
        })
    }

    async fn engine_against(server: &MockServer, store: Arc<MemoryVectorStore>) -> ContextChatEngine {
        let client = create_client_with_config(
            OpenAIConfig::new()
                .with_api_base(server.uri())
                .with_api_key("test-key"),
        );
        let builder = ContextBuilder::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])))
            .with_max_chunks(4)
            .with_min_score(0.5);

        ContextChatEngine::new(
            client,
            "gpt-4o-mini",
            "你是教授".to_string(),
            Prompts::default().tutor.context,
            builder,
            ChatMemoryBuffer::new(3000),
        )
    }

    async fn request_messages(server: &MockServer, index: usize) -> Vec<serde_json::Value> {
        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[index].body).unwrap();
        body["messages"].as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_chat_injects_retrieved_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("存量是累積。")))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(&Document::new(
                "ch3.txt".to_string(),
                "存量是系統中的累積量。".to_string(),
                vec![1.0, 0.0],
                0,
            ))
            .await
            .unwrap();

        let mut engine = engine_against(&server, store).await;
        let response = engine.chat("什麼是存量？").await.unwrap();

        assert_eq!(response.answer, "存量是累積。");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].source_file, "ch3.txt");

        let messages = request_messages(&server, 0).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "你是教授");
        let user_content = messages[1]["content"].as_str().unwrap();
        assert!(user_content.contains("存量是系統中的累積量。"));
        assert!(user_content.contains("什麼是存量？"));
    }

    #[tokio::test]
    async fn test_chat_without_matches_sends_raw_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("請教課程問題。")))
            .mount(&server)
            .await;

        let mut engine = engine_against(&server, Arc::new(MemoryVectorStore::new())).await;
        let response = engine.chat("今天天氣如何？").await.unwrap();

        assert!(response.sources.is_empty());
        let messages = request_messages(&server, 0).await;
        assert_eq!(messages[1]["content"], "今天天氣如何？");
    }

    #[tokio::test]
    async fn test_memory_carries_previous_turns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("回答")))
            .mount(&server)
            .await;

        let mut engine = engine_against(&server, Arc::new(MemoryVectorStore::new())).await;
        engine.chat("第一題").await.unwrap();
        engine.chat("第二題").await.unwrap();

        let messages = request_messages(&server, 1).await;
        // system + remembered user/assistant pair + current message
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "第一題");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["content"], "回答");
        assert_eq!(messages[3]["content"], "第二題");
    }

    #[tokio::test]
    async fn test_reset_clears_memory() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("回答")))
            .mount(&server)
            .await;

        let mut engine = engine_against(&server, Arc::new(MemoryVectorStore::new())).await;
        engine.chat("第一題").await.unwrap();
        engine.reset();
        engine.chat("第二題").await.unwrap();

        let messages = request_messages(&server, 1).await;
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_api_error_leaves_memory_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut engine = engine_against(&server, Arc::new(MemoryVectorStore::new())).await;
        let err = engine.chat("第一題").await.unwrap_err();
        assert!(matches!(err, DocentError::OpenAI(_)));
        assert!(engine.memory.is_empty());
    }
}
