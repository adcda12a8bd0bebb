//! Client error type.

use thiserror::Error;

/// Errors surfaced to the portal UI.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally; no request was made.
    #[error("{0}")]
    Validation(String),

    /// The server answered with an error envelope.
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        user_id: Option<String>,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Reading or writing the persisted session failed.
    #[error("Session storage error: {0}")]
    Session(String),
}

impl ClientError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The server error code, if this came from the server.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the server answered with `code`.
    #[must_use]
    pub fn is_code(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    /// The account ID some auth errors carry.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Api { user_id, .. } => user_id.as_deref(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Session(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Session(err.to_string())
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
