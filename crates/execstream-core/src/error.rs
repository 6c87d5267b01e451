//! Error types for execstream

/// Result type alias using execstream's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for execstream operations
///
/// The per-delta streaming path never produces one of these; anomalies in a
/// live stream degrade to silence or to the unrecognized-tool fallback.
/// Errors come from setup and request preparation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Conversation history cannot be normalized
    #[error("history error: {0}")]
    History(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new history error
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
