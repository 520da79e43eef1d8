//! Configuration module for Docent.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, TutorPrompts};
pub use settings::{
    ChatSettings, ChunkingSettings, CorpusSettings, EmbeddingSettings, PromptSettings,
    RetrievalSettings, Settings, StorageSettings,
};
