//! HTTP client implementation using reqwest

use crate::http::{InvokeClient, RequestOptions};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Maximum response size to prevent OOM (64MB; image payloads are large)
const MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("modelgate/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ProviderResult<Self> {
        Self::with_config(Duration::from_secs(10), Duration::from_secs(60), 10)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> ProviderResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// POST a JSON body and return the parsed JSON response.
    ///
    /// Non-success statuses are mapped through
    /// [`map_http_error`](crate::http::error::map_http_error); a timeout is
    /// reported as such and later folded into the generic upstream failure
    /// shape by the error translator.
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<Value> {
        let request_id = options.request_id;
        debug!(url, %request_id, "dispatching provider call");

        let response = self
            .client
            .post(url)
            .timeout(options.timeout)
            .header("X-Request-ID", request_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(url, %request_id, "provider call timed out");
                    ProviderError::Timeout {
                        seconds: options.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    error!(url, %request_id, "connection failed: {e}");
                    ProviderError::Network(format!("Connection failed: {e}"))
                } else {
                    error!(url, %request_id, "request error: {e}");
                    ProviderError::Network(format!("{e} [request_id: {request_id}]"))
                }
            })?;

        let status = response.status();
        debug!(%status, %request_id, "provider responded");

        if !status.is_success() {
            let body = response.text().await.ok();
            warn!(%status, %request_id, "provider call failed");
            return Err(crate::http::error::map_http_error(status, body, request_id));
        }

        self.check_content_length(&response)?;

        let text = response.text().await.map_err(|e| {
            ProviderError::Network(format!(
                "Failed to read response body: {e} [request_id: {request_id}]"
            ))
        })?;
        if text.len() > self.max_response_size {
            return Err(ProviderError::Parse(format!(
                "Response size {} exceeds maximum {} [request_id: {request_id}]",
                text.len(),
                self.max_response_size
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(%request_id, "invalid provider response: {e}");
            ProviderError::Parse(format!(
                "Invalid response format: {e} [request_id: {request_id}]"
            ))
        })
    }

    fn check_content_length(&self, response: &Response) -> ProviderResult<()> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(ProviderError::Parse(format!(
                    "Response size {content_length} exceeds maximum {}",
                    self.max_response_size
                )));
            }
        }
        Ok(())
    }
}

/// Model invocation over the native `POST {base}/model/{id}/invoke` wire
/// contract.
pub struct HttpInvokeClient {
    http: HttpClient,
    base_url: String,
}

impl HttpInvokeClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl InvokeClient for HttpInvokeClient {
    async fn invoke(
        &self,
        model_id: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<Value> {
        let url = format!("{}/model/{}/invoke", self.base_url, model_id);
        self.http.post_json(&url, body, options).await
    }
}
