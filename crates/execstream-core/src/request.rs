//! Outgoing completion requests
//!
//! The model is offered exactly one function, `execute(language, code)`,
//! whose `language` parameter is restricted to the languages the caller can
//! run.

use crate::config::EmitterConfig;
use crate::error::{Error, Result};
use crate::history::HistoryNormalizer;
use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Declaration of the execution tool under its default name
pub fn execute_tool_schema<S: AsRef<str>>(languages: &[S]) -> Value {
    tool_schema(&EmitterConfig::default().execute_tool, languages)
}

/// Declaration of the execution tool under `name`
///
/// Language names are lowercased and deduplicated, keeping their order.
pub fn tool_schema<S: AsRef<str>>(name: &str, languages: &[S]) -> Value {
    let mut language_enum: Vec<String> = Vec::with_capacity(languages.len());
    for language in languages {
        let language = language.as_ref().to_lowercase();
        if !language_enum.contains(&language) {
            language_enum.push(language);
        }
    }

    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": "Executes code on the user's machine **in the users local environment** and returns the output",
            "parameters": {
                "type": "object",
                "properties": {
                    "language": {
                        "type": "string",
                        "description": format!("The programming language (required parameter to the `{}` function)", name),
                        "enum": language_enum,
                    },
                    "code": {
                        "type": "string",
                        "description": "The code to execute (required)",
                    },
                },
                "required": ["language", "code"],
            },
        },
    })
}

/// Body of a streaming chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model name
    pub model: String,

    /// Normalized conversation history
    pub messages: Vec<ChatMessage>,

    /// Tool declarations
    pub tools: Vec<Value>,

    /// Always true: responses are consumed as deltas
    pub stream: bool,
}

impl CompletionRequest {
    /// Build a request offering the default execution tool
    pub fn prepare<S: AsRef<str>>(
        model: impl Into<String>,
        history: Vec<ChatMessage>,
        languages: &[S],
    ) -> Result<Self> {
        Self::prepare_for(&EmitterConfig::default(), model, history, languages)
    }

    /// Build a request offering the execution tool named in `config`
    pub fn prepare_for<S: AsRef<str>>(
        config: &EmitterConfig,
        model: impl Into<String>,
        history: Vec<ChatMessage>,
        languages: &[S],
    ) -> Result<Self> {
        if languages.is_empty() {
            return Err(Error::config("at least one language is required"));
        }

        let messages = HistoryNormalizer.normalize(history)?;
        tracing::debug!(messages = messages.len(), languages = languages.len(), "prepared request");

        Ok(Self {
            model: model.into(),
            messages,
            tools: vec![tool_schema(&config.execute_tool, languages)],
            stream: true,
        })
    }
}

/// Read a JSON array of chat messages from `path`
pub fn load_history(path: impl AsRef<Path>) -> Result<Vec<ChatMessage>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_schema_shape() {
        let schema = execute_tool_schema(&["Python", "Shell", "python", "JavaScript"]);

        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "execute");

        let parameters = &schema["function"]["parameters"];
        assert_eq!(parameters["required"], json!(["language", "code"]));
        assert_eq!(
            parameters["properties"]["language"]["enum"],
            json!(["python", "shell", "javascript"])
        );
        assert_eq!(parameters["properties"]["code"]["type"], "string");
    }

    #[test]
    fn test_prepare_normalizes_history() {
        let history = vec![
            ChatMessage::user("run it"),
            ChatMessage::assistant("").with_function_call("execute", "{}"),
            ChatMessage::function_result("execute", "ok"),
        ];

        let request = CompletionRequest::prepare("gpt-4o", history, &["python"]).unwrap();
        assert!(request.stream);
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.messages[2].role, Role::Tool);
        assert_eq!(request.messages[2].tool_call_id.as_deref(), Some("toolu_1"));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][1]["tool_calls"][0]["type"], "function");
    }

    #[test]
    fn test_prepare_uses_configured_tool_name() {
        let config = EmitterConfig {
            execute_tool: "run_code".to_string(),
            ..Default::default()
        };
        let request = CompletionRequest::prepare_for(&config, "m", Vec::new(), &["python"]).unwrap();
        assert_eq!(request.tools[0]["function"]["name"], "run_code");
    }

    #[test]
    fn test_prepare_requires_languages() {
        let result = CompletionRequest::prepare::<&str>("m", Vec::new(), &[]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_history_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"[{"role":"user","content":"hi"},{"role":"function","name":"execute","content":"ok"}]"#,
        )
        .unwrap();

        let history = load_history(file.path()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Function);
        assert_eq!(history[1].name.as_deref(), Some("execute"));
    }

    #[test]
    fn test_load_history_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"role\":").unwrap();
        assert!(matches!(load_history(file.path()), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_load_history_missing_file() {
        let result = load_history("/nonexistent/execstream/history.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
