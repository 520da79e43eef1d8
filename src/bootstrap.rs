//! Startup wiring for the tutor.
//!
//! Validates the credential, decides build-vs-load for the course index, and
//! hands out chat sessions over the configured engine. The decision order is
//! load-bearing: the credential is checked before any document or network
//! access, and a cold-start build touches the filesystem only after every
//! chunk has been embedded.

use crate::chunking::{self, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::corpus;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{DocentError, Result};
use crate::openai::create_client;
use crate::rag::{ChatMemoryBuffer, ContextBuilder, ContextChatEngine, TutorSession};
use crate::vector_store::{Document, SqliteVectorStore, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

static TUTOR: OnceCell<Arc<Tutor>> = OnceCell::const_new();

/// Everything bootstrap needs, captured up front.
///
/// Snapshotting keeps initialization testable: the credential is read from
/// the environment exactly once, here.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// API credential. Absence is a fatal configuration error.
    pub api_key: Option<String>,
    /// Directory of raw course documents.
    pub docs_dir: PathBuf,
    /// Path of the persisted vector index.
    pub index_path: PathBuf,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub chunking: ChunkingConfig,
    pub max_context_chunks: usize,
    pub min_score: f32,
    pub memory_token_limit: usize,
    pub temperature: f32,
    pub show_sources: bool,
    /// Rendered persona system prompt.
    pub system_prompt: String,
    /// Template that wraps retrieved context around a question.
    pub context_template: String,
    /// Suffix appended to every outgoing user message.
    pub language_suffix: String,
}

impl BootstrapConfig {
    /// Snapshot settings, prompts, and the environment credential.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            docs_dir: settings.docs_dir(),
            index_path: settings.index_path(),
            chat_model: settings.chat.model.clone(),
            embedding_model: settings.embedding.model.clone(),
            embedding_dimensions: settings.embedding.dimensions as usize,
            chunking: ChunkingConfig::from(&settings.chunking),
            max_context_chunks: settings.retrieval.max_context_chunks,
            min_score: settings.retrieval.min_score,
            memory_token_limit: settings.chat.memory_token_limit,
            temperature: settings.chat.temperature,
            show_sources: settings.chat.show_sources,
            system_prompt: prompts.tutor_system(),
            context_template: prompts.tutor.context.clone(),
            language_suffix: prompts.tutor.language_suffix.clone(),
        })
    }
}

/// How the index came to be ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Built from the raw course documents and persisted.
    Built { documents: usize, chunks: usize },
    /// Loaded from the persisted index, trusted as-is.
    Loaded { chunks: usize },
}

/// The initialized tutor: index, API bindings, and session factory.
pub struct Tutor {
    config: BootstrapConfig,
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    vector_store: Arc<SqliteVectorStore>,
    embedder: Arc<dyn Embedder>,
    outcome: IndexOutcome,
}

// Omits the credential-bearing config and live bindings from the output.
impl std::fmt::Debug for Tutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tutor")
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl Tutor {
    /// Process-wide bootstrap: first call initializes, later calls return the
    /// cached tutor and ignore their config. There is no path back short of
    /// a restart; a failed initialization leaves the slot empty for retry.
    pub async fn bootstrap(config: BootstrapConfig) -> Result<Arc<Tutor>> {
        let tutor = TUTOR
            .get_or_try_init(|| async {
                Ok::<_, DocentError>(Arc::new(Self::initialize(config).await?))
            })
            .await?;
        Ok(tutor.clone())
    }

    /// Initialize with the OpenAI-backed bindings.
    #[instrument(skip_all)]
    pub async fn initialize(config: BootstrapConfig) -> Result<Self> {
        // Credential first; nothing else may be touched without it.
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                DocentError::Config(format!(
                    "{} is not set. Export your OpenAI API key before starting the tutor.",
                    API_KEY_ENV
                ))
            })?;

        let client = create_client(&api_key);
        let embedder = Arc::new(OpenAIEmbedder::new(
            client.clone(),
            &config.embedding_model,
            config.embedding_dimensions,
        ));

        Self::initialize_with_embedder(config, client, embedder).await
    }

    /// Initialize with injected bindings (tests, alternate backends).
    pub async fn initialize_with_embedder(
        config: BootstrapConfig,
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let (vector_store, outcome) = Self::build_or_load_index(&config, embedder.as_ref()).await?;

        Ok(Self {
            config,
            client,
            vector_store: Arc::new(vector_store),
            embedder,
            outcome,
        })
    }

    /// Decide build-vs-load. A present index is trusted unconditionally; the
    /// document directory is not consulted, so staleness goes undetected.
    async fn build_or_load_index(
        config: &BootstrapConfig,
        embedder: &dyn Embedder,
    ) -> Result<(SqliteVectorStore, IndexOutcome)> {
        if config.index_path.exists() {
            let store = SqliteVectorStore::new(&config.index_path)?;
            let chunks = store.document_count().await?;
            info!("Loaded persisted index ({} chunks)", chunks);
            return Ok((store, IndexOutcome::Loaded { chunks }));
        }

        info!(
            "No index at {:?}; building from {:?}",
            config.index_path, config.docs_dir
        );
        let course_docs = corpus::load_corpus(&config.docs_dir)?;

        let mut texts = Vec::new();
        let mut chunk_meta = Vec::new();
        for doc in &course_docs {
            for chunk in chunking::chunk_text(&doc.text, &config.chunking) {
                chunk_meta.push((doc.file_name.clone(), chunk.order));
                texts.push(chunk.content);
            }
        }

        // Embed before the index file exists; a failed build leaves nothing behind.
        let embeddings = embedder.embed_batch(&texts).await?;

        let documents: Vec<Document> = texts
            .into_iter()
            .zip(embeddings)
            .zip(chunk_meta)
            .map(|((content, embedding), (source_file, order))| {
                Document::new(source_file, content, embedding, order)
            })
            .collect();

        let store = SqliteVectorStore::new(&config.index_path)?;
        let chunks = store.upsert_batch(&documents).await?;
        info!(
            "Built index: {} documents, {} chunks",
            course_docs.len(),
            chunks
        );

        Ok((
            store,
            IndexOutcome::Built {
                documents: course_docs.len(),
                chunks,
            },
        ))
    }

    /// Open a fresh tutor session.
    pub fn new_session(&self) -> TutorSession {
        let context_builder = ContextBuilder::new(self.vector_store(), self.embedder.clone())
            .with_max_chunks(self.config.max_context_chunks)
            .with_min_score(self.config.min_score);

        let engine = ContextChatEngine::new(
            self.client.clone(),
            &self.config.chat_model,
            self.config.system_prompt.clone(),
            self.config.context_template.clone(),
            context_builder,
            ChatMemoryBuffer::new(self.config.memory_token_limit),
        )
        .with_temperature(self.config.temperature);

        TutorSession::new(
            Box::new(engine),
            &self.config.language_suffix,
            self.config.show_sources,
        )
    }

    /// The vector store, as a trait object.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone() as Arc<dyn VectorStore>
    }

    /// How the index was readied during initialization.
    pub fn outcome(&self) -> IndexOutcome {
        self.outcome
    }
}
