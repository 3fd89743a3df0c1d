//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Map an HTTP error status and response body to a ProviderError
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> ProviderError {
    let detail = body
        .as_ref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_message(&v))
        .or(body)
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    let message = format!("{detail} [request_id: {request_id}]");

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::Timeout { seconds: 0 }
        }
        status if status.is_server_error() => ProviderError::Upstream {
            status: Some(status.as_u16()),
            message,
        },
        status if status.is_client_error() => ProviderError::InvalidInput {
            message,
            param: None,
        },
        _ => ProviderError::Upstream {
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// Extract a human-readable message from common error body shapes.
fn extract_error_message(json: &Value) -> Option<String> {
    // Bare form: { "message": "..." }
    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    // OpenAI-style: { "error": { "message": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // Generic: { "error": "..." }
    json.get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}
