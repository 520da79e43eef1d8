//! CLI module for Docent.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Docent - Course Material Tutor
///
/// A RAG-backed study assistant. Docent indexes your course materials into a
/// local vector store, then answers questions as a subject tutor with
/// citations back to the source files.
#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Docent and set up directories
    Init,

    /// Check configuration and course materials
    Doctor,

    /// Build or update the course index from the documents directory
    Index {
        /// Discard the existing index and rebuild everything
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a single question about the course materials
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for the answer
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of context chunks to include
        #[arg(short = 'c', long, default_value = "10")]
        max_chunks: usize,
    },

    /// Search the course materials without asking the tutor
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// Start an interactive tutoring session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed course materials
    List,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "chat.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
