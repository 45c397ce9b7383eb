//! Core error types

use thiserror::Error;

/// Errors raised while wiring the pipeline together.
///
/// Configuration problems are fatal at construction time. Service failures never reach
/// the pipeline's caller: classifiers turn them into safe default labels.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Language model service error: {0}")]
    Service(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Whether this error should abort startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CoreError::Service(_))
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
