//! Provider error types and handling

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while resolving, dispatching or parsing a provider
/// call. These are internal; the error translator in [`crate::error`] turns
/// them into the single caller-facing shape.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Model identifier did not resolve in the capability registry
    #[error("The model `{model}` does not exist or you do not have access to it.")]
    ModelNotFound { model: String },

    /// Malformed, empty or unsupported input, or an unsupported parameter
    /// combination for the resolved model
    #[error("{message}")]
    InvalidInput {
        message: String,
        param: Option<String>,
    },

    /// Provider returned an error status
    #[error("Provider error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Outbound call exceeded its deadline
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Provider response did not match its documented schema
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// Object storage failure during media offload
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ProviderError {
    /// Client-error shorthand without an offending parameter name.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            param: None,
        }
    }

    /// Client-error shorthand naming the offending parameter.
    pub fn invalid_param(param: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            param: Some(param.to_string()),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { seconds: 30 }
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection failed: {err}"))
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
