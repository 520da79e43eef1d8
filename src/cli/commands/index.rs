//! Index command - build or update the course index explicitly.

use crate::bootstrap::{BootstrapConfig, API_KEY_ENV};
use crate::chunking;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::DocentError;
use crate::openai::create_client;
use crate::vector_store::{Document, SqliteVectorStore, VectorStore};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the index command.
///
/// Without `--force`, files already present in the index are skipped, so the
/// command can pick up new course materials incrementally. With `--force`,
/// the index file is removed first and everything is rebuilt.
pub async fn run_index(force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let config = BootstrapConfig::from_settings(&settings)?;
    let api_key = config.api_key.clone().ok_or_else(|| {
        DocentError::Config(format!("{} is not set.", API_KEY_ENV))
    })?;

    if force {
        remove_index_files(&config.index_path)?;
    }

    let course_docs = corpus::load_corpus(&config.docs_dir)?;
    let store = SqliteVectorStore::new(&config.index_path)?;
    let client = create_client(&api_key);
    let embedder = OpenAIEmbedder::new(
        client,
        &config.embedding_model,
        config.embedding_dimensions,
    );

    let pb = Output::progress_bar(course_docs.len() as u64, "Indexing course materials");

    let mut indexed = 0usize;
    let mut skipped = 0usize;
    let mut total_chunks = 0usize;

    for doc in &course_docs {
        pb.set_message(doc.file_name.clone());

        if !force && store.is_source_indexed(&doc.file_name).await? {
            skipped += 1;
            pb.inc(1);
            continue;
        }

        store.delete_by_source(&doc.file_name).await?;

        let chunks = chunking::chunk_text(&doc.text, &config.chunking);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                Document::new(doc.file_name.clone(), chunk.content, embedding, chunk.order)
            })
            .collect();

        total_chunks += store.upsert_batch(&documents).await?;
        indexed += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();

    Output::success("Indexing complete.");
    Output::kv("Indexed", &indexed.to_string());
    Output::kv("Skipped", &skipped.to_string());
    Output::kv("Chunks written", &total_chunks.to_string());

    if skipped > 0 {
        Output::info("Use --force to rebuild files that are already indexed.");
    }

    Ok(())
}

/// Remove the index database and its WAL sidecars.
fn remove_index_files(index_path: &Path) -> std::io::Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut os = index_path.as_os_str().to_os_string();
        os.push(suffix);
        let path = PathBuf::from(os);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
