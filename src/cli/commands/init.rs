//! Init command - interactive first-run setup.

use crate::bootstrap::API_KEY_ENV;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Docent Setup");
    println!();
    println!("Welcome to Docent! Let's make sure everything is configured correctly.\n");

    // Step 1: Check API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var(API_KEY_ENV).is_err() {
        Output::warning(&format!("{} environment variable is not set.", API_KEY_ENV));
        println!();
        println!("  Docent requires an OpenAI API key for answers and embeddings.");
        println!(
            "  Get your API key from: {}",
            style("https://platform.openai.com/api-keys").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'docent init' again.");
            return Ok(());
        }
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    let docs_dir = settings.docs_dir();
    let index_dir = settings.index_dir();

    if !docs_dir.exists() {
        std::fs::create_dir_all(&docs_dir)?;
        Output::success(&format!("Created documents directory: {}", docs_dir.display()));
    } else {
        Output::info(&format!("Documents directory exists: {}", docs_dir.display()));
    }

    if !index_dir.exists() {
        std::fs::create_dir_all(&index_dir)?;
        Output::success(&format!("Created index directory: {}", index_dir.display()));
    } else {
        Output::info(&format!("Index directory exists: {}", index_dir.display()));
    }

    println!();
    println!(
        "  Put your course materials ({}) into {}",
        style(".txt / .md files").bold(),
        style(docs_dir.display()).bold()
    );

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("docent config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check everything is in place", style("docent doctor").cyan());
    println!("  {} Build the course index", style("docent index").cyan());
    println!("  {} Start a tutoring session", style("docent chat").cyan());
    println!(
        "  {} Ask a one-shot question",
        style("docent ask \"<question>\"").cyan()
    );
    println!();
    println!("For more help: {}", style("docent --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
