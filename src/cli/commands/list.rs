//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::Result;

/// Run the list command. Works offline; no credential required.
pub async fn run_list(settings: Settings) -> Result<()> {
    let index_path = settings.index_path();

    if !index_path.exists() {
        Output::info("No course index yet. Use 'docent index' to build one.");
        return Ok(());
    }

    let store = SqliteVectorStore::new(&index_path)?;

    match store.list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("The course index is empty. Use 'docent index' to add materials.");
            } else {
                Output::header(&format!("Indexed Course Materials ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(&source.source_file, source.chunk_count, &source.indexed_at);
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total files", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list course materials: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
