//! Anthropic Messages SSE Stream Adapter
//!
//! ```text
//! event: content_block_start
//! data: {"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"execute","input":{}}}
//!
//! event: content_block_delta
//! data: {"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"language\":"}}
//!
//! event: message_stop
//! data: {"type":"message_stop"}
//! ```
//!
//! Events are dispatched on the JSON `type` field; the `event:` lines are
//! redundant and skipped.

use crate::stream_adapter::{sse_data, ParsedChunk, StreamAdapter};
use crate::types::{Delta, FunctionCallDelta, ToolCallDelta};
use serde::Deserialize;

/// Anthropic Messages SSE stream adapter
#[derive(Debug, Clone, Default)]
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    /// Create a new Anthropic adapter
    pub fn new() -> Self {
        Self
    }

    fn parse_event(&self, json_str: &str) -> ParsedChunk {
        let event = match serde_json::from_str::<AnthropicEvent>(json_str) {
            Ok(event) => event,
            Err(e) => return ParsedChunk::Error(format!("Failed to parse Anthropic event: {}", e)),
        };

        match event {
            AnthropicEvent::ContentBlockStart {
                index,
                content_block: ContentBlock::ToolUse { id, name },
            } => tool_chunk(index, Some(id), FunctionCallDelta::name(name)),

            AnthropicEvent::ContentBlockStart {
                content_block: ContentBlock::Text { text },
                ..
            } if !text.is_empty() => text_chunk(text),

            AnthropicEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => text_chunk(text),
                BlockDelta::InputJsonDelta { partial_json } => {
                    tool_chunk(index, None, FunctionCallDelta::arguments(partial_json))
                }
                BlockDelta::Other => ParsedChunk::Empty,
            },

            AnthropicEvent::MessageDelta { delta } => {
                // The stop reason is informational; message_stop ends the stream
                if let Some(reason) = delta.stop_reason {
                    tracing::trace!(stop_reason = %reason, "Anthropic message delta");
                }
                ParsedChunk::Empty
            }

            AnthropicEvent::MessageStop => ParsedChunk::done(None),

            AnthropicEvent::Error { error } => ParsedChunk::Error(format!(
                "Anthropic stream error: {}",
                error.message.unwrap_or_else(|| "unknown".to_string())
            )),

            _ => ParsedChunk::Empty,
        }
    }
}

fn text_chunk(text: String) -> ParsedChunk {
    ParsedChunk::Delta(Delta::content(text))
}

fn tool_chunk(index: usize, id: Option<String>, function: FunctionCallDelta) -> ParsedChunk {
    ParsedChunk::Delta(Delta {
        tool_calls: Some(vec![ToolCallDelta {
            index,
            id,
            function: Some(function),
        }]),
        ..Default::default()
    })
}

impl StreamAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn parse(&self, data: &str) -> Vec<ParsedChunk> {
        data.lines()
            .filter_map(sse_data)
            .filter(|json_str| !json_str.is_empty())
            .map(|json_str| self.parse_event(json_str))
            .collect()
    }
}

// =============================================================================
// Anthropic Event Structures
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    ContentBlockStart {
        #[serde(default)]
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: usize,
        delta: BlockDelta,
    },
    MessageDelta {
        delta: MessageDeltaBody,
    },
    MessageStop,
    Error {
        error: ErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse {
        id: String,
        name: String,
    },
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}
