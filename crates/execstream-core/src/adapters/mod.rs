//! Stream Adapters
//!
//! Adapters decoding provider streaming formats into [`Delta`](crate::types::Delta)s.

mod anthropic;
mod openai;

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiAdapter;

use crate::stream_adapter::StreamAdapter;

/// Get an adapter by name, falling back to OpenAI
pub fn get_adapter(name: &str) -> Box<dyn StreamAdapter> {
    match name.to_lowercase().as_str() {
        "anthropic" | "claude" => Box::new(AnthropicAdapter::new()),
        "openai" | "openai_sse" => Box::new(OpenAiAdapter::new()),
        other => {
            tracing::warn!(adapter = other, "Unknown adapter, using openai");
            Box::new(OpenAiAdapter::new())
        }
    }
}
