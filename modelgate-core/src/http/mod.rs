//! HTTP layer for outbound provider calls
//!
//! This module implements the transport used to reach the model backends:
//! - Connection pooling and client management
//! - Per-call timeout enforcement
//! - Error mapping from HTTP statuses to provider errors
//! - Request ID generation and correlation
//!
//! There is deliberately no retry here: a single upstream failure fails the
//! whole request (see the error translator), so transient-failure policy
//! belongs to the caller of the gateway, not this layer.

pub mod client;
pub mod error;

pub use client::{HttpClient, HttpInvokeClient};

use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Options for one outbound call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Deadline for this call
    pub timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RequestOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout,
        }
    }

    /// Derive options sharing this request's ID.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            request_id: self.request_id,
            timeout,
        }
    }
}

/// Seam for invoking a model backend with a native JSON body.
///
/// One implementation speaks the real wire protocol; tests substitute
/// in-process fakes.
#[async_trait]
pub trait InvokeClient: Send + Sync {
    /// Invoke `model_id` with the provider-native `body` and return the
    /// provider-native response body.
    async fn invoke(
        &self,
        model_id: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<Value>;
}
