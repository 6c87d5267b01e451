//! ExecStream Core
//!
//! Reconstructs a user-facing event stream from the incremental deltas of a
//! tool-calling LLM response.
//!
//! This crate provides:
//! - Best-effort parsing of truncated JSON arguments
//! - Delta merging and tool-call dialect normalization
//! - The per-turn emitter producing `Message`, `Code` and `Review` events
//! - Safety review tag splitting
//! - Outgoing history normalization and request building
//! - Stream adapters for OpenAI and Anthropic SSE formats

pub mod accumulator;
pub mod adapters;
pub mod config;
pub mod emitter;
pub mod error;
pub mod history;
pub mod partial_json;
pub mod request;
pub mod review;
pub mod stream;
pub mod stream_adapter;
pub mod tool_calls;
pub mod types;

pub use accumulator::{Accumulator, Merge};
pub use adapters::{get_adapter, AnthropicAdapter, OpenAiAdapter};
pub use config::EmitterConfig;
pub use emitter::{StreamEventEmitter, TurnState};
pub use error::{Error, Result};
pub use history::HistoryNormalizer;
pub use partial_json::{parse_partial_json, PartialJson};
pub use request::{execute_tool_schema, load_history, tool_schema, CompletionRequest};
pub use review::ReviewTagSplitter;
pub use stream::{EventIter, EventStream};
pub use stream_adapter::{decode_lines, ParsedChunk, StreamAdapter};
pub use tool_calls::{CanonicalDelta, ToolCallNormalizer};
pub use types::{ChatMessage, Delta, Event, FunctionCallDelta, ReviewCategory, Role};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EmitterConfig;
    pub use crate::emitter::StreamEventEmitter;
    pub use crate::error::{Error, Result};
    pub use crate::stream_adapter::{decode_lines, ParsedChunk, StreamAdapter};
    pub use crate::types::{ChatMessage, Delta, Event, FunctionCallDelta, ReviewCategory};
}
