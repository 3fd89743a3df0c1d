//! Configuration error types

use thiserror::Error;

/// Errors raised while loading gateway configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    /// `${VAR}` placeholder referenced an unset environment variable
    #[error("Environment variable {name} referenced by config is not set")]
    MissingEnvVar { name: String },
}
