//! Ask command implementation.

use crate::bootstrap::{BootstrapConfig, Tutor};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command: one question on a fresh session.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_chunks: usize,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut config = BootstrapConfig::from_settings(&settings)?;
    if let Some(model) = model {
        config.chat_model = model;
    }
    config.max_context_chunks = max_chunks;

    let spinner = if config.index_path.exists() {
        Output::spinner("Loading course index...")
    } else {
        Output::spinner("Reading course materials and building the index...")
    };

    let tutor = match Tutor::bootstrap(config).await {
        Ok(tutor) => {
            spinner.finish_and_clear();
            tutor
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
            Output::info("Run 'docent doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    };

    let mut session = tutor.new_session();

    let spinner = Output::spinner("Searching course materials...");
    match session.send(question).await {
        Ok(turn) => {
            spinner.finish_and_clear();

            println!("\n{}\n", turn.content);

            if let Some(sources) = &turn.sources {
                Output::header("Sources");
                println!("\n{}", sources);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
