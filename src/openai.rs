//! OpenAI client configuration with sensible defaults.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client bound to the given API key.
///
/// Uses a 5-minute timeout by default to prevent hung API calls.
pub fn create_client(api_key: &str) -> Client<OpenAIConfig> {
    create_client_with_config(OpenAIConfig::new().with_api_key(api_key))
}

/// Create a client from an explicit configuration (custom base URL, etc.).
pub fn create_client_with_config(config: OpenAIConfig) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(config).with_http_client(http_client)
}
