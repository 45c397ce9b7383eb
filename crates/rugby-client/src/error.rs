//! Error types for the chat-completions client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Well-formed response without a first choice
    #[error("Response contained no choices")]
    EmptyResponse,
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ClientError> for rugby_core::CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Config(msg) => rugby_core::CoreError::configuration(msg),
            ClientError::Url(e) => rugby_core::CoreError::configuration(e.to_string()),
            other => rugby_core::CoreError::service(other.to_string()),
        }
    }
}
