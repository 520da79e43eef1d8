//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let config_path = Settings::default_config_path();

            let mut table: toml::Table = if config_path.exists() {
                std::fs::read_to_string(&config_path)?.parse()?
            } else {
                toml::Table::new()
            };

            set_dotted_key(&mut table, key, value)?;

            // Reject values the settings loader would choke on later.
            toml::Value::Table(table.clone())
                .try_into::<Settings>()
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, toml::to_string_pretty(&table)?)?;

            Output::success(&format!("Set {} = {}", key, value));
            Output::kv("Config file", &config_path.display().to_string());
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Set a dotted key like "chat.model" in a TOML table, creating intermediate
/// tables as needed.
fn set_dotted_key(table: &mut toml::Table, key: &str, raw: &str) -> Result<()> {
    let mut parts: Vec<&str> = key.split('.').collect();
    let leaf = parts.pop().unwrap_or_default();
    if leaf.is_empty() || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("Invalid configuration key: {}", key);
    }

    let mut current = table;
    for part in parts {
        current = current
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()))
            .as_table_mut()
            .ok_or_else(|| anyhow::anyhow!("{} is not a table", part))?;
    }

    current.insert(leaf.to_string(), parse_value(raw));
    Ok(())
}

/// Parse a raw CLI value as TOML, falling back to a plain string.
fn parse_value(raw: &str) -> toml::Value {
    format!("v = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
