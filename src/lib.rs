//! Docent - Course Material Tutor
//!
//! A RAG-backed study assistant for course materials. Docent indexes lecture
//! notes and readings into a local vector store, then answers questions as a
//! subject tutor with citations back to the source files.
//!
//! # Overview
//!
//! Docent allows you to:
//! - Index a directory of course materials (.txt / .md)
//! - Hold a tutoring conversation grounded in those materials
//! - Get answers with citations back to the source files
//! - Search the materials semantically without invoking the tutor
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `corpus` - Course material loading
//! - `chunking` - Sliding-window text chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `rag` - Context retrieval, chat engine, and tutor sessions
//! - `bootstrap` - Startup wiring and the build-or-load index decision
//!
//! # Example
//!
//! ```rust,no_run
//! use docent::bootstrap::{BootstrapConfig, Tutor};
//! use docent::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let config = BootstrapConfig::from_settings(&settings)?;
//!     let tutor = Tutor::bootstrap(config).await?;
//!
//!     let mut session = tutor.new_session();
//!     let turn = session.send("什麼是存量與流量？").await?;
//!     println!("{}", turn.content);
//!
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod rag;
pub mod vector_store;

pub use error::{DocentError, Result};
