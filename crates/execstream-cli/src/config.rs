//! CLI configuration

use crate::{Cli, Command};
use execstream_core::EmitterConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Stream format adapter name
    #[serde(default = "default_adapter")]
    pub adapter: String,

    /// Model named in prepared requests
    #[serde(default = "default_model")]
    pub model: String,

    /// Languages offered in the execution tool's enum
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Function names the emitter recognizes
    #[serde(default)]
    pub emitter: EmitterConfig,
}

impl CliConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            tracing::debug!(path = config_path, "no configuration file, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(adapter) = &cli.adapter {
            config.adapter = adapter.clone();
        }

        if let Command::Prepare { model, languages, .. } = &cli.command {
            if let Some(model) = model {
                config.model = model.clone();
            }

            if !languages.is_empty() {
                config.languages = languages.clone();
            }
        }

        config.emitter.validate()?;
        Ok(config)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            adapter: default_adapter(),
            model: default_model(),
            languages: default_languages(),
            emitter: EmitterConfig::default(),
        }
    }
}

fn default_adapter() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["python".to_string(), "shell".to_string()]
}
