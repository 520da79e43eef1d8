//! Doctor command - verify configuration and course materials.

use crate::bootstrap::API_KEY_ENV;
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Docent Doctor");
    println!();
    println!("Checking configuration and course materials...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key();
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Course Materials").bold());
    let material_checks = check_materials(settings);
    for check in &material_checks {
        check.print();
    }
    checks.extend(material_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Docent.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Docent is ready to use.");
    }

    Ok(())
}

/// Check if the OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok(API_KEY_ENV, &format!("configured ({})", masked))
        }
        Ok(key) if key.trim().is_empty() => CheckResult::error(
            API_KEY_ENV,
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            API_KEY_ENV,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            API_KEY_ENV,
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the documents directory and the persisted index.
///
/// Missing materials are fatal only while there is no index to fall back on;
/// once the index exists startups no longer read the documents.
fn check_materials(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let docs_dir = settings.docs_dir();
    let index_path = settings.index_path();
    let index_exists = index_path.exists();

    match corpus::count_documents(&docs_dir) {
        Some(count) if count > 0 => {
            results.push(CheckResult::ok(
                "Documents",
                &format!("{} file(s) in {}", count, docs_dir.display()),
            ));
        }
        Some(_) if index_exists => {
            results.push(CheckResult::warning(
                "Documents",
                &format!("none found in {}", docs_dir.display()),
                "The index is already built; materials are only needed for reindexing",
            ));
        }
        Some(_) => {
            results.push(CheckResult::error(
                "Documents",
                &format!("{} contains no course documents", docs_dir.display()),
                "Add .txt or .md files before the first index build",
            ));
        }
        None if index_exists => {
            results.push(CheckResult::warning(
                "Documents",
                &format!("{} does not exist", docs_dir.display()),
                "The index is already built; materials are only needed for reindexing",
            ));
        }
        None => {
            results.push(CheckResult::error(
                "Documents",
                &format!("{} does not exist", docs_dir.display()),
                "Create it and add .txt or .md course materials",
            ));
        }
    }

    if index_exists {
        let size = std::fs::metadata(&index_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Index",
            &format!("{} ({})", index_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Index",
            &format!("{} (not built yet)", index_path.display()),
            "Built automatically on first chat, or run 'docent index'",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: docent init (or docent config edit)",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
