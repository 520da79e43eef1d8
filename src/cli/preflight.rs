//! Pre-flight checks before expensive operations.
//!
//! Gives a friendly, actionable error before an operation that would
//! otherwise fail midway. The authoritative credential gate lives in
//! bootstrap; this layer only improves the CLI experience.

use crate::bootstrap::API_KEY_ENV;
use crate::error::{DocentError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Interactive tutoring needs the API credential.
    Chat,
    /// One-shot questions need the API credential.
    Ask,
    /// Indexing embeds documents, so it needs the API credential.
    Index,
    /// Search embeds the query, so it needs the API credential.
    Search,
    /// Listing reads the local index only.
    List,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Chat | Operation::Ask | Operation::Index | Operation::Search => {
            check_api_key()?;
        }
        Operation::List => {}
    }
    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(DocentError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
        Err(_) => Err(DocentError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
    }
}
