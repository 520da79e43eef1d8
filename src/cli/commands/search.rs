//! Search command implementation.

use crate::bootstrap::{BootstrapConfig, API_KEY_ENV};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::DocentError;
use crate::openai::create_client;
use crate::rag::context::ContextBuilder;
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the search command: retrieval only, no LLM call.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: f32,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let config = BootstrapConfig::from_settings(&settings)?;

    if !config.index_path.exists() {
        Output::error("No course index found.");
        Output::info("Run 'docent index' (or start 'docent chat') to build it first.");
        return Err(DocentError::NotFound("course index".to_string()).into());
    }

    let api_key = config.api_key.clone().ok_or_else(|| {
        DocentError::Config(format!("{} is not set.", API_KEY_ENV))
    })?;

    let store = Arc::new(SqliteVectorStore::new(&config.index_path)?);
    let client = create_client(&api_key);
    let embedder = Arc::new(OpenAIEmbedder::new(
        client,
        &config.embedding_model,
        config.embedding_dimensions,
    ));

    let context_builder = ContextBuilder::new(store, embedder)
        .with_max_chunks(limit)
        .with_min_score(min_score);

    let spinner = Output::spinner("Searching...");
    let results = context_builder.build(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", chunks.len()));

                for chunk in &chunks {
                    Output::search_result(&chunk.source_file, chunk.score, &chunk.content);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
