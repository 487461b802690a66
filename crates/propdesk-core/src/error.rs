//! Error types for propdesk

use thiserror::Error;

/// Core error type for propdesk operations
#[derive(Error, Debug)]
pub enum PropdeskError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Record is missing identifier field '{field}'")]
    MissingIdentifier { field: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for propdesk operations
pub type Result<T> = std::result::Result<T, PropdeskError>;
