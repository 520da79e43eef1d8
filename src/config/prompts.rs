//! Prompt templates for Docent.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub tutor: TutorPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts defining the tutor persona and its context injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorPrompts {
    /// Persona system prompt. Supports {{subject}} and {{outline}}.
    pub system: String,
    /// Wrapper that injects retrieved course excerpts into the user turn.
    pub context: String,
    /// Suffix appended to every user message before it reaches the engine.
    pub language_suffix: String,
    /// Opening line shown when a session starts. Supports {{subject}}.
    pub greeting: String,
}

impl Default for TutorPrompts {
    fn default() -> Self {
        Self {
            system: "你是一位具備 30 年教學經驗的『{{subject}}權威教授』。請遵守以下最高指導原則：\n\
                1. 語言鎖定：你只使用『台灣繁體中文』回答。嚴禁使用簡體字、大陸用語（如質量、優化、打印）。\n\
                2. 消除冗餘：直接回答問題，嚴禁使用『根據提供的教材』、『根據上下文』等生硬開場白。將知識視為你腦中的內在智慧。\n\
                3. 專業守則：回答僅限於{{subject}}。若問題無關，請列出教學大綱（{{outline}}）並引導回課程。\n\
                4. 結構化回答：具備學術深度，重要專有名詞加註英文。"
                .to_string(),

            context: "以下是課程教材中的相關段落：\n\n{{context}}\n\n{{question}}".to_string(),

            language_suffix: " (注意：請務必以繁體中文回答，嚴禁簡體)".to_string(),

            greeting: "哈囉！我是你的{{subject}}助教，有任何課程問題都可以問我喔！".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load tutor prompts if file exists
            let tutor_path = custom_path.join("tutor.toml");
            if tutor_path.exists() {
                let content = std::fs::read_to_string(&tutor_path)?;
                prompts.tutor = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Built-in template variables, overridable through config `variables`.
    fn default_variables() -> std::collections::HashMap<String, String> {
        let mut vars = std::collections::HashMap::new();
        vars.insert("subject".to_string(), "系統動力學".to_string());
        vars.insert("outline".to_string(), "Ch 3, 5, 6, 11".to_string());
        vars
    }

    /// Render the tutor system prompt with defaults merged under config variables.
    pub fn tutor_system(&self) -> String {
        Self::render(&self.tutor.system, &self.merged_variables())
    }

    /// Render the session greeting the same way.
    pub fn tutor_greeting(&self) -> String {
        Self::render(&self.tutor.greeting, &self.merged_variables())
    }

    fn merged_variables(&self) -> std::collections::HashMap<String, String> {
        let mut vars = Self::default_variables();
        for (key, value) in &self.variables {
            vars.insert(key.clone(), value.clone());
        }
        vars
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.tutor.system.is_empty());
        assert!(!prompts.tutor.language_suffix.is_empty());
        assert!(prompts.tutor.context.contains("{{context}}"));
        assert!(prompts.tutor.context.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_tutor_system_uses_default_subject() {
        let prompts = Prompts::default();
        let system = prompts.tutor_system();
        assert!(system.contains("系統動力學"));
        assert!(system.contains("Ch 3, 5, 6, 11"));
        assert!(!system.contains("{{subject}}"));
    }

    #[test]
    fn test_greeting_renders_subject() {
        let prompts = Prompts::default();
        let greeting = prompts.tutor_greeting();
        assert!(greeting.contains("系統動力學"));
        assert!(!greeting.contains("{{subject}}"));
    }

    #[test]
    fn test_config_variables_override_defaults() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("subject".to_string(), "個體經濟學".to_string());
        prompts
            .variables
            .insert("outline".to_string(), "Ch 1, 2, 4".to_string());

        let system = prompts.tutor_system();
        assert!(system.contains("個體經濟學"));
        assert!(system.contains("Ch 1, 2, 4"));
        assert!(!system.contains("系統動力學"));
    }

    #[test]
    fn test_custom_dir_overrides_tutor_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tutor.toml"),
            "system = \"You teach {{subject}}.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(Some(dir.path().to_str().unwrap()), None).unwrap();
        assert_eq!(prompts.tutor.system, "You teach {{subject}}.");
        // Fields missing from the override file fall back to defaults.
        assert!(!prompts.tutor.language_suffix.is_empty());
    }
}
