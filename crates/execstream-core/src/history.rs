//! Outgoing history normalization
//!
//! Histories recorded against the legacy single-function dialect are
//! reshaped for the tool-calling dialect before a request is sent:
//!
//! - an assistant message with a `function_call` becomes an assistant message
//!   with one `tool_calls` entry under a synthetic id (`toolu_1`, `toolu_2`, ...)
//! - function/tool results become `tool` messages answering the most recent
//!   call id
//! - consecutive results are merged into one message

use crate::error::{Error, Result};
use crate::types::{ChatMessage, Role, ToolCall};
use tracing::debug;

const SYNTHETIC_ID_PREFIX: &str = "toolu_";

/// Rewrites conversation history into the tool-calling dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryNormalizer;

impl HistoryNormalizer {
    /// Normalize `messages`, numbering synthetic call ids from 1
    pub fn normalize(&self, messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        let mut output: Vec<ChatMessage> = Vec::with_capacity(messages.len());
        let mut issued = 0usize;
        let mut last_call_id: Option<String> = None;

        for (position, mut message) in messages.into_iter().enumerate() {
            if let Some(function) = message.function_call.take() {
                issued += 1;
                let id = format!("{}{}", SYNTHETIC_ID_PREFIX, issued);
                debug!(position, id = %id, function = %function.name, "rewriting legacy function call");

                message.role = Role::Assistant;
                message.tool_calls = Some(vec![ToolCall::function(id.clone(), function)]);
                last_call_id = Some(id);
            } else if let Some(call) = message.tool_calls.as_ref().and_then(|calls| calls.last()) {
                last_call_id = Some(call.id.clone());
            }

            if message.role.is_tool_result() {
                if let Some(previous) = output.last_mut().filter(|m| m.role == Role::Tool) {
                    if let Some(content) = message.content {
                        previous.content.get_or_insert_with(String::new).push_str(&content);
                    }
                    continue;
                }

                message.role = Role::Tool;
                if message.tool_call_id.is_none() {
                    let id = last_call_id.clone().ok_or_else(|| {
                        Error::history(format!(
                            "tool result at position {} does not follow any function call",
                            position
                        ))
                    })?;
                    message.tool_call_id = Some(id);
                }
            }

            output.push(message);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FunctionCall;

    fn normalize(messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        HistoryNormalizer.normalize(messages)
    }

    #[test]
    fn test_legacy_call_rewritten() {
        let messages = vec![
            ChatMessage::user("list files"),
            ChatMessage::assistant("Sure.").with_function_call("execute", r#"{"language":"shell","code":"ls"}"#),
            ChatMessage::function_result("execute", "a.txt\n"),
        ];

        let output = normalize(messages).unwrap();
        assert_eq!(output.len(), 3);

        let call = &output[1];
        assert_eq!(call.role, Role::Assistant);
        assert!(call.function_call.is_none());
        assert_eq!(call.content.as_deref(), Some("Sure."));

        let tool_calls = call.tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].id, "toolu_1");
        assert_eq!(tool_calls[0].kind, "function");
        assert_eq!(tool_calls[0].function.name, "execute");

        let result = &output[2];
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("toolu_1"));
    }

    #[test]
    fn test_ids_numbered_per_call() {
        let messages = vec![
            ChatMessage::assistant("").with_function_call("execute", "{}"),
            ChatMessage::function_result("execute", "one"),
            ChatMessage::user("again"),
            ChatMessage::assistant("").with_function_call("execute", "{}"),
            ChatMessage::function_result("execute", "two"),
        ];

        let output = normalize(messages).unwrap();
        assert_eq!(output[1].tool_call_id.as_deref(), Some("toolu_1"));
        assert_eq!(output[3].tool_calls.as_ref().unwrap()[0].id, "toolu_2");
        assert_eq!(output[4].tool_call_id.as_deref(), Some("toolu_2"));
    }

    #[test]
    fn test_consecutive_results_merged() {
        let messages = vec![
            ChatMessage::assistant("").with_function_call("execute", "{}"),
            ChatMessage::function_result("execute", "line 1\n"),
            ChatMessage::function_result("execute", "line 2\n"),
            ChatMessage::new(Role::Tool, "line 3\n"),
            ChatMessage::user("thanks"),
        ];

        let output = normalize(messages).unwrap();
        assert_eq!(output.len(), 3);
        assert_eq!(output[1].content.as_deref(), Some("line 1\nline 2\nline 3\n"));
        assert_eq!(output[2].role, Role::User);

        let consecutive_results = output
            .windows(2)
            .any(|pair| pair[0].role.is_tool_result() && pair[1].role.is_tool_result());
        assert!(!consecutive_results);
    }

    #[test]
    fn test_canonical_calls_kept() {
        let mut call = ChatMessage::assistant("");
        call.tool_calls = Some(vec![ToolCall::function(
            "call_abc",
            FunctionCall {
                name: "execute".to_string(),
                arguments: "{}".to_string(),
            },
        )]);

        let mut answered = ChatMessage::new(Role::Tool, "done");
        answered.tool_call_id = Some("call_abc".to_string());

        let output = normalize(vec![call.clone(), ChatMessage::function_result("execute", "out")]).unwrap();
        assert_eq!(output[0], call);
        assert_eq!(output[1].tool_call_id.as_deref(), Some("call_abc"));

        let output = normalize(vec![call, answered.clone()]).unwrap();
        assert_eq!(output[1], answered);
    }

    #[test]
    fn test_orphan_result_is_error() {
        let messages = vec![ChatMessage::user("hi"), ChatMessage::function_result("execute", "?")];
        assert!(matches!(normalize(messages), Err(Error::History(_))));
    }

    #[test]
    fn test_plain_history_untouched() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        assert_eq!(normalize(messages.clone()).unwrap(), messages);
    }
}
