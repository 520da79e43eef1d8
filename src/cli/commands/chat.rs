//! Interactive tutoring session.

use crate::bootstrap::{BootstrapConfig, IndexOutcome, Tutor};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::error::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docent doctor' for detailed diagnostics.");
        return Err(e);
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let mut config = BootstrapConfig::from_settings(&settings)?;
    if let Some(model) = model {
        config.chat_model = model;
    }

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
            return Err(e);
        }
    };

    match tutor.outcome() {
        IndexOutcome::Built { documents, chunks } => {
            Output::success(&format!(
                "Indexed {} course documents ({} chunks)",
                documents, chunks
            ));
        }
        IndexOutcome::Loaded { chunks } => {
            Output::success(&format!("Course index ready ({} chunks)", chunks));
        }
    }

    let mut session = tutor.new_session();

    println!("\n{}", style("Docent Tutor").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset the conversation.")
            .dim()
    );
    println!(
        "{} {}\n",
        style("Tutor:").cyan().bold(),
        prompts.tutor_greeting()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF on stdin
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            Output::info("Conversation cleared.");
            continue;
        }

        let spinner = Output::spinner("助教思考中...");
        match session.send(input).await {
            Ok(turn) => {
                spinner.finish_and_clear();
                println!("\n{} {}\n", style("Tutor:").cyan().bold(), turn.content);
                if let Some(sources) = &turn.sources {
                    println!("{}", style(sources).dim());
                }
            }
            Err(e) => {
                spinner.finish_and_clear();
                // The failed turn is over; the session stays usable.
                Output::error(&format!("{}", e));
            }
        }
    }

    Ok(())
}
