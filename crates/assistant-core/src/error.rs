//! Error Types

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Assistant error types
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Free-text query did not resolve to a registered token
    #[error("Unknown token in query: {query}")]
    UnknownToken {
        query: String,
        suggestions: Vec<String>,
    },

    /// Token registration rejected
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AssistantError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::UnknownToken { query, .. } => {
                format!("Could not identify a token in \"{query}\"")
            }
            AssistantError::InvalidToken(msg) => format!("Invalid token: {}", msg),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AssistantError {
    fn from(err: anyhow::Error) -> Self {
        AssistantError::Other(err.to_string())
    }
}
