//! Crate-wide error type.

use std::time::Duration;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A role name that is not one of the five roles.
    #[error("Unknown role '{0}' (expected Initiator, Listener, Challenger, Synthesizer or Explorer)")]
    InvalidRole(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status from an LLM provider.
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM response contained no reply text")]
    EmptyReply,

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    /// An operation was invoked in a match state that does not allow it.
    #[error("Match is not accepting this action: {0}")]
    MatchState(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }
}
