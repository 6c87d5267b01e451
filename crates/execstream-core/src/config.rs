//! Emitter configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Names the emitter recognizes in an incoming function call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Name of the single declared execution function
    #[serde(default = "default_execute_tool")]
    pub execute_tool: String,

    /// Hallucinated names whose raw arguments are the code itself
    #[serde(default = "default_direct_code_aliases")]
    pub direct_code_aliases: Vec<String>,

    /// Language used when the model never states one
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
}

impl EmitterConfig {
    /// Whether `name` is one of the direct-code aliases
    pub fn is_direct_code_alias(&self, name: &str) -> bool {
        self.direct_code_aliases.iter().any(|alias| alias == name)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.execute_tool.is_empty() {
            return Err(Error::config("execute_tool must not be empty"));
        }

        if self.fallback_language.is_empty() {
            return Err(Error::config("fallback_language must not be empty"));
        }

        if let Some(alias) = self
            .direct_code_aliases
            .iter()
            .find(|alias| alias.is_empty() || **alias == self.execute_tool)
        {
            return Err(Error::config(format!("invalid direct code alias {:?}", alias)));
        }

        Ok(())
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            execute_tool: default_execute_tool(),
            direct_code_aliases: default_direct_code_aliases(),
            fallback_language: default_fallback_language(),
        }
    }
}

fn default_execute_tool() -> String {
    "execute".to_string()
}

fn default_direct_code_aliases() -> Vec<String> {
    vec!["python".to_string(), "functions".to_string()]
}

fn default_fallback_language() -> String {
    "python".to_string()
}
