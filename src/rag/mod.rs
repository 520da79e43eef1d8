//! RAG (Retrieval-Augmented Generation) over the course-material index.
//!
//! Retrieval feeds a context-mode chat engine; the tutor session layers the
//! persona policy and conversation history on top.

pub mod context;
mod engine;
mod memory;
mod session;

pub use context::ContextBuilder;
pub use engine::{ChatEngine, ContextChatEngine, EngineResponse};
pub use memory::ChatMemoryBuffer;
pub use session::{ChatTurn, Citation, TutorSession};

use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};

/// Speaker role for a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A retrieved course excerpt with its citation metadata.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// File name of the course material.
    pub source_file: String,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            source_file: result.document.source_file,
            content: result.document.content,
            score: result.score,
        }
    }
}
