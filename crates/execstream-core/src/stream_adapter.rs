//! Stream Adapter System
//!
//! Provides a pluggable system for decoding provider streaming formats
//! (OpenAI chat completions, Anthropic Messages) into [`Delta`]s.

use crate::types::Delta;
use futures::stream::{self, Stream, StreamExt};
use std::fmt::{Debug, Display};
use std::future::ready;
use tracing::{debug, warn};

/// Represents a parsed chunk from a streaming response
#[derive(Debug, Clone)]
pub enum ParsedChunk {
    /// An incremental fragment of the assistant turn
    Delta(Delta),

    /// Stream completion signal
    Done {
        /// Reason for completion (stop, tool_calls, length, etc.)
        finish_reason: Option<String>,
    },

    /// Nothing relevant in this chunk (keep-alives, usage-only chunks, ...)
    Empty,

    /// Parse error
    Error(String),
}

impl ParsedChunk {
    /// Create a done chunk
    pub fn done(finish_reason: Option<String>) -> Self {
        Self::Done { finish_reason }
    }

    /// Check if this is a done signal
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// Trait for decoding different streaming formats
///
/// Implementations handle format-specific parsing for SSE streams from
/// various LLM providers. They are stateless: each call sees one piece of
/// the wire text, typically one line or one SSE event.
pub trait StreamAdapter: Send + Sync + Debug {
    /// Name of this adapter (for logging/debugging)
    fn name(&self) -> &str;

    /// Parse raw text into chunks
    ///
    /// # Arguments
    /// * `data` - Raw string data from the stream (one line or one SSE event)
    ///
    /// # Returns
    /// A vector of parsed chunks (may be empty, one, or multiple)
    fn parse(&self, data: &str) -> Vec<ParsedChunk>;
}

/// Decode wire lines into the deltas of one response
///
/// Stops at the first done signal. Parse and read errors are logged and
/// skipped.
pub fn decode_lines<S, E>(adapter: Box<dyn StreamAdapter>, lines: S) -> impl Stream<Item = Delta>
where
    S: Stream<Item = std::result::Result<String, E>>,
    E: Display,
{
    lines
        .map(move |line| match line {
            Ok(line) => adapter.parse(&line),
            Err(e) => vec![ParsedChunk::Error(format!("failed to read stream: {}", e))],
        })
        .flat_map(stream::iter)
        .inspect(|chunk| {
            if let ParsedChunk::Done { finish_reason } = chunk {
                debug!(finish_reason = ?finish_reason, "upstream finished");
            }
        })
        .take_while(|chunk| ready(!chunk.is_done()))
        .filter_map(|chunk| {
            ready(match chunk {
                ParsedChunk::Delta(delta) => Some(delta),
                ParsedChunk::Error(msg) => {
                    warn!(error = %msg, "skipping undecodable chunk");
                    None
                }
                ParsedChunk::Done { .. } | ParsedChunk::Empty => None,
            })
        })
}

/// Strip the SSE `data:` prefix from a line, if present
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.trim().strip_prefix("data:").map(str::trim)
}
