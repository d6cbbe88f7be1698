//! Error types for MGNREGA ingestion and analytics

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MgnregaError {
    // Upstream errors
    #[error("Request timeout after {timeout_ms}ms - upstream API is slow: {message}")]
    Timeout { timeout_ms: u64, message: String },

    #[error("Failed to fetch upstream data: {message}")]
    Upstream {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    // Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MgnregaError {
    /// Whether the failure came from the upstream request exceeding its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, MgnregaError::Timeout { .. })
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        MgnregaError::Upstream {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    pub fn storage(message: impl std::fmt::Display) -> Self {
        MgnregaError::Storage(message.to_string())
    }
}

impl From<serde_json::Error> for MgnregaError {
    fn from(err: serde_json::Error) -> Self {
        MgnregaError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MgnregaError>;
