//! Caller-facing error shape and the error translator
//!
//! Every failure crossing the gateway boundary is a [`GatewayError`]:
//! an HTTP status plus the OpenAI error envelope fields. No other component
//! constructs caller-facing errors; adapters and resolvers raise
//! [`ProviderError`](crate::providers::error::ProviderError) values and the
//! `From` conversion here is the single translation point, so the shape stays
//! uniform and internal details never leak raw to the caller.

use crate::providers::error::ProviderError;
use serde::Serialize;
use thiserror::Error;

/// Error type string for deterministic client errors
pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";

/// Error type string for upstream failures
pub const SERVER_ERROR: &str = "server_error";

/// Uniform caller-facing error
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GatewayError {
    /// HTTP status the front door should answer with
    pub status: u16,

    /// OpenAI error taxonomy type
    pub error_type: &'static str,

    /// OpenAI error code, when one applies
    pub code: Option<&'static str>,

    /// Offending request parameter, when known
    pub param: Option<String>,

    /// Human-readable message naming the violated constraint
    pub message: String,
}

/// Serialized form: `{"error": {"message", "type", "param", "code"}}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    error_type: &'a str,
    param: Option<&'a str>,
    code: Option<&'a str>,
}

impl GatewayError {
    /// The OpenAI error envelope for this error.
    pub fn envelope(&self) -> ErrorEnvelope<'_> {
        ErrorEnvelope {
            error: ErrorBody {
                message: &self.message,
                error_type: self.error_type,
                param: self.param.as_deref(),
                code: self.code,
            },
        }
    }
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ModelNotFound { .. } => GatewayError {
                status: 404,
                error_type: INVALID_REQUEST_ERROR,
                code: Some("model_not_found"),
                param: None,
                message: err.to_string(),
            },
            ProviderError::InvalidInput { message, param } => GatewayError {
                status: 400,
                error_type: INVALID_REQUEST_ERROR,
                code: None,
                param,
                message,
            },
            ProviderError::Upstream { status, message } => GatewayError {
                // 5xx statuses pass through; anything else the provider
                // refused that escaped adapter policy reports as a gateway
                // problem rather than blaming the caller.
                status: match status {
                    Some(status) if status >= 500 => status,
                    _ => 502,
                },
                error_type: SERVER_ERROR,
                code: None,
                param: None,
                message,
            },
            // Timeouts are not distinguishable from other upstream failures
            // in the caller-facing shape.
            ProviderError::Timeout { .. }
            | ProviderError::Network(_)
            | ProviderError::Parse(_)
            | ProviderError::Storage(_) => GatewayError {
                status: 502,
                error_type: SERVER_ERROR,
                code: None,
                param: None,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_not_found_maps_to_404_with_code() {
        let err: GatewayError = ProviderError::ModelNotFound {
            model: "missing".to_string(),
        }
        .into();
        assert_eq!(err.status, 404);
        assert_eq!(err.error_type, INVALID_REQUEST_ERROR);
        assert_eq!(err.code, Some("model_not_found"));
    }

    #[test]
    fn invalid_input_maps_to_400_with_null_code() {
        let err: GatewayError = ProviderError::invalid_param("dimensions", "bad value").into();
        assert_eq!(err.status, 400);
        assert_eq!(err.code, None);
        assert_eq!(err.param.as_deref(), Some("dimensions"));

        let value = serde_json::to_value(err.envelope()).unwrap();
        assert_eq!(value["error"]["type"], "invalid_request_error");
        assert_eq!(value["error"]["code"], serde_json::Value::Null);
        assert_eq!(value["error"]["param"], "dimensions");
    }

    #[test]
    fn upstream_5xx_passes_through_and_timeout_is_generic() {
        let err: GatewayError = ProviderError::Upstream {
            status: Some(503),
            message: "unavailable".to_string(),
        }
        .into();
        assert_eq!(err.status, 503);
        assert_eq!(err.error_type, SERVER_ERROR);

        let timeout: GatewayError = ProviderError::Timeout { seconds: 30 }.into();
        assert_eq!(timeout.status, 502);
        assert_eq!(timeout.error_type, SERVER_ERROR);
    }
}
