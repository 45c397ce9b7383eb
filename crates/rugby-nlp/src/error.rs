//! NLP-specific error types

use rugby_core::CoreError;
use rugby_data::DataError;
use thiserror::Error;

/// NLP-specific error types
#[derive(Error, Debug)]
pub enum NlpError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NlpError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for NLP operations
pub type Result<T> = std::result::Result<T, NlpError>;

impl From<CoreError> for NlpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Service(msg) => NlpError::classification(msg),
            other => NlpError::configuration(other.to_string()),
        }
    }
}

// Corpus failures surface while wiring the engine, so they count as configuration.
impl From<DataError> for NlpError {
    fn from(err: DataError) -> Self {
        NlpError::configuration(err.to_string())
    }
}

impl From<regex::Error> for NlpError {
    fn from(err: regex::Error) -> Self {
        NlpError::internal(format!("Invalid pattern: {}", err))
    }
}
