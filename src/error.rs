use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;

/// Main error type for brandrag
#[derive(Error, Debug)]
pub enum BrandragError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Content store errors
    #[error("Content store error: {0}")]
    Store(#[from] StoreError),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for brandrag operations
pub type Result<T> = std::result::Result<T, BrandragError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_context_wraps_module_errors() {
        let failed: std::result::Result<(), EmbeddingError> =
            Err(EmbeddingError::InvalidInput("empty text".to_string()));
        let err: BrandragError = failed
            .context("Failed to embed content for project acme")
            .unwrap_err()
            .into();

        assert_eq!(err.to_string(), "Failed to embed content for project acme");
        match err {
            BrandragError::Other(inner) => {
                assert_eq!(inner.root_cause().to_string(), "Invalid input: empty text");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
