//! Error types for the relay.

use thiserror::Error;

use crate::render::RenderedMessage;

/// Top-level relay error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid context: {0}")]
    Context(#[from] ContextError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),
}

/// Structural errors: a context is missing something the requested operation needs.
///
/// These are always integration bugs. They are surfaced to the caller and never shown
/// to the players involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Context does not meet requirement {requirement}!")]
    MissingRequirement { requirement: String },

    #[error("Unknown account: {id}")]
    UnknownAccount { id: u64 },
}

impl ContextError {
    pub fn missing(requirement: impl ToString) -> Self {
        Self::MissingRequirement {
            requirement: requirement.to_string(),
        }
    }
}

/// A filter refused a message.
///
/// Carries the explanation shown to the sender. Only the dispatcher handles this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Message blocked: {reason}")]
pub struct BlockMessage {
    pub reason: RenderedMessage,
}

impl BlockMessage {
    pub fn new(reason: impl Into<RenderedMessage>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Chat log persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Chat log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chat log unavailable: {message}")]
    Unavailable { message: String },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors while replaying a recorded event stream.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Malformed event: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Event refers to unknown account {id}")]
    UnknownAccount { id: u64 },

    #[error("Invalid event: {message}")]
    InvalidEvent { message: String },
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for context validation.
pub type ContextResult<T> = std::result::Result<T, ContextError>;

/// Result type alias for filter application.
pub type FilterResult<T> = std::result::Result<T, BlockMessage>;

/// Result type alias for chat log operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
