//! Error types for the OOB adapter

use thiserror::Error;

/// Main error type for adapter construction and configuration
///
/// Validation and polling never produce this type: a failed poll is reported
/// through [`crate::models::ValidationResult`] instead.
#[derive(Debug, Error)]
pub enum OobError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Unknown filter type '{0}'")]
    UnknownFilterType(String),

    #[error("Unknown match policy '{0}'")]
    UnknownMatchPolicy(String),

    #[error("{provider} bootstrap failed: {reason}")]
    Bootstrap { provider: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OobError {
    pub(crate) fn bootstrap(provider: impl ToString, reason: impl Into<String>) -> Self {
        OobError::Bootstrap {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, OobError>;
