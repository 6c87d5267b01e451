//! OpenAI SSE Stream Adapter
//!
//! Parses the OpenAI chat completions streaming format:
//! ```text
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","created":1234567890,"model":"gpt-4","choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"lan"}}]},"finish_reason":null}]}
//!
//! data: [DONE]
//! ```
//!
//! Both the legacy `function_call` and the indexed `tool_calls` delta shapes
//! are decoded as-is; dialect resolution happens in the emitter.

use crate::stream_adapter::{sse_data, ParsedChunk, StreamAdapter};
use crate::types::Delta;
use serde::Deserialize;

/// OpenAI SSE stream adapter
#[derive(Debug, Clone, Default)]
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    /// Create a new OpenAI adapter
    pub fn new() -> Self {
        Self
    }

    /// Parse a single SSE data payload
    fn parse_data_line(&self, json_str: &str, chunks: &mut Vec<ParsedChunk>) {
        let chunk = match serde_json::from_str::<OpenAiChunk>(json_str) {
            Ok(chunk) => chunk,
            Err(e) => {
                chunks.push(ParsedChunk::Error(format!("Failed to parse OpenAI chunk: {}", e)));
                return;
            }
        };

        // Usage-only and keep-alive chunks carry no choices
        let Some(choice) = chunk.choices.into_iter().next() else {
            chunks.push(ParsedChunk::Empty);
            return;
        };

        if choice.delta.is_empty() {
            if choice.finish_reason.is_none() {
                chunks.push(ParsedChunk::Empty);
            }
        } else {
            if choice.index > 0 {
                tracing::trace!(index = choice.index, "delta from a secondary choice");
            }
            chunks.push(ParsedChunk::Delta(choice.delta));
        }

        if let Some(reason) = choice.finish_reason {
            chunks.push(ParsedChunk::done(Some(reason)));
        }
    }
}

impl StreamAdapter for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai"
    }

    fn parse(&self, data: &str) -> Vec<ParsedChunk> {
        let mut chunks = Vec::new();

        for line in data.lines() {
            // Skip empty lines, comments and non-data fields
            let Some(json_str) = sse_data(line) else {
                continue;
            };

            if json_str == "[DONE]" {
                chunks.push(ParsedChunk::done(None));
                continue;
            }

            // Skip empty data
            if json_str.is_empty() {
                continue;
            }

            self.parse_data_line(json_str, &mut chunks);
        }

        chunks
    }
}

// =============================================================================
// OpenAI Response Structures
// =============================================================================

#[derive(Debug, Deserialize)]
struct OpenAiChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}
