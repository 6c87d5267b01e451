//! Core types for execstream
//!
//! Wire-facing delta shapes, the outgoing chat message model, and the typed
//! events handed to downstream consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fragment of a function call: both fields extend whatever came before
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallDelta {
    /// Fragment of the function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fragment of the JSON arguments text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl FunctionCallDelta {
    /// Create a fragment carrying only a name piece
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            arguments: None,
        }
    }

    /// Create a fragment carrying only an arguments piece
    pub fn arguments(arguments: impl Into<String>) -> Self {
        Self {
            name: None,
            arguments: Some(arguments.into()),
        }
    }
}

/// One entry of the indexed tool-call dialect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Position of the call within the assistant turn
    #[serde(default)]
    pub index: usize,

    /// Provider-assigned call id (usually only on the first fragment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Function fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCallDelta>,
}

/// An incremental fragment of a streaming assistant response
///
/// A provider fills in whichever fields it uses; an entirely empty delta is
/// a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Legacy single function-call fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallDelta>,

    /// Indexed tool-call fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

impl Delta {
    /// Text-only delta
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    /// Legacy function-call delta
    pub fn function_call(fragment: FunctionCallDelta) -> Self {
        Self {
            function_call: Some(fragment),
            ..Default::default()
        }
    }

    /// Indexed tool-call delta with a single entry
    pub fn tool_call(index: usize, fragment: FunctionCallDelta) -> Self {
        Self {
            tool_calls: Some(vec![ToolCallDelta {
                index,
                id: None,
                function: Some(fragment),
            }]),
            ..Default::default()
        }
    }

    /// True when no recognized field is present
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.function_call.is_none() && self.tool_calls.is_none()
    }
}

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Legacy function result
    Function,
    /// Canonical tool result
    Tool,
}

impl Role {
    /// Whether this role carries the output of a function/tool invocation
    pub fn is_tool_result(self) -> bool {
        matches!(self, Self::Function | Self::Tool)
    }
}

/// A complete function call as it appears in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A canonical tool-call entry on an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a function-type tool call
    pub fn function(id: impl Into<String>, function: FunctionCall) -> Self {
        Self {
            id: id.into(),
            kind: default_tool_type(),
            function,
        }
    }
}

fn default_tool_type() -> String {
    "function".to_string()
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    #[serde(default)]
    pub content: Option<String>,

    /// Optional name of the sender (legacy function results carry one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Legacy single function call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// Canonical tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Id of the call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a legacy function result message
    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Role::Function, content)
        }
    }

    /// Attach a legacy function call
    pub fn with_function_call(mut self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        self.function_call = Some(FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        });
        self
    }
}

/// Safety classification attached to a code review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewCategory {
    Safe,
    Warning,
    Unsafe,
}

impl ReviewCategory {
    /// Categories in the order their opening markers are checked
    pub const PRECEDENCE: [ReviewCategory; 3] = [Self::Safe, Self::Warning, Self::Unsafe];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Unsafe => "unsafe",
        }
    }

    /// The `<category>` marker
    pub fn opening_marker(self) -> &'static str {
        match self {
            Self::Safe => "<safe>",
            Self::Warning => "<warning>",
            Self::Unsafe => "<unsafe>",
        }
    }

    /// The `</category>` marker
    pub fn closing_marker(self) -> &'static str {
        match self {
            Self::Safe => "</safe>",
            Self::Warning => "</warning>",
            Self::Unsafe => "</unsafe>",
        }
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed slice of the reconstructed response
///
/// Events are deltas: concatenating every `Code` event of a turn yields the
/// full code string, and likewise for `Message` and `Review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Ordinary assistant text
    Message { content: String },

    /// Code to execute, tagged with its language
    Code { format: String, content: String },

    /// Safety review narration, tagged with its category
    Review {
        format: ReviewCategory,
        content: String,
    },
}

impl Event {
    /// Create a message event
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    /// Create a code event
    pub fn code(format: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Code {
            format: format.into(),
            content: content.into(),
        }
    }

    /// Create a review event
    pub fn review(format: ReviewCategory, content: impl Into<String>) -> Self {
        Self::Review {
            format,
            content: content.into(),
        }
    }

    /// Short kind label, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Code { .. } => "code",
            Self::Review { .. } => "review",
        }
    }

    /// The text slice carried by this event
    pub fn content(&self) -> &str {
        match self {
            Self::Message { content } | Self::Code { content, .. } | Self::Review { content, .. } => {
                content
            }
        }
    }
}
