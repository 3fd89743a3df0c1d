//! Configuration module for the gateway core
//!
//! Deployment-specific settings: backend endpoints, timeouts, media offload
//! thresholds, the storage bucket, and per-model default parameters that are
//! merged beneath request-supplied extra parameters.

mod env;
mod error;
mod schema;

pub use error::ConfigError;
pub use schema::{
    EndpointConfig, EndpointsConfig, GatewayConfig, MediaConfig, StorageConfig, TimeoutConfig,
};

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    let interpolated = env::interpolate_env_vars(&content)?;

    serde_json::from_str(&interpolated).map_err(|e| ConfigError::Parse {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })
}
