//! Configuration schema

use crate::media::{DEFAULT_MEDIA_INLINE_LIMIT, DEFAULT_TEXT_INLINE_LIMIT};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Backend service endpoints
    pub endpoints: EndpointsConfig,

    /// Outbound call timeouts
    pub timeouts: TimeoutConfig,

    /// Inline-vs-offload thresholds
    pub media: MediaConfig,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Per-model default parameters, merged beneath request extras
    /// (request-supplied values win)
    pub default_model_params: HashMap<String, Map<String, Value>>,
}

impl GatewayConfig {
    /// Default parameters for a model merged with request extras.
    pub fn merged_extra_params(
        &self,
        model_id: &str,
        request_extra: &Map<String, Value>,
    ) -> Map<String, Value> {
        let mut params = self
            .default_model_params
            .get(model_id)
            .cloned()
            .unwrap_or_default();
        for (key, value) in request_extra {
            params.insert(key.clone(), value.clone());
        }
        params
    }
}

/// One backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
}

/// Backend endpoints for model invocation and the speech services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Model invocation API (`POST /model/{id}/invoke`)
    pub model_api: EndpointConfig,

    /// Transcription service
    pub transcribe: EndpointConfig,

    /// Text translation service
    pub translate: EndpointConfig,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            model_api: EndpointConfig {
                base_url: "http://127.0.0.1:8081".to_string(),
            },
            transcribe: EndpointConfig {
                base_url: "http://127.0.0.1:8082".to_string(),
            },
            translate: EndpointConfig {
                base_url: "http://127.0.0.1:8083".to_string(),
            },
        }
    }
}

/// Outbound timeouts in seconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub request_secs: u64,
    /// Deadline for model invocations, which can be slow for video inputs
    pub invoke_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
            invoke_secs: 300,
        }
    }
}

/// Inline-vs-offload thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Largest media payload sent inline, in bytes
    pub inline_limit_bytes: usize,

    /// Largest text payload sent inline, in characters, for providers that
    /// accept text by reference
    pub text_inline_limit_chars: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            inline_limit_bytes: DEFAULT_MEDIA_INLINE_LIMIT,
            text_inline_limit_chars: DEFAULT_TEXT_INLINE_LIMIT,
        }
    }
}

/// Object storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "modelgate-media".to_string(),
        }
    }
}
