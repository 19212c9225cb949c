//! HTTP transport seam.
//!
//! [`ApiClient`](super::ApiClient) never talks to reqwest directly; it goes
//! through [`Transport`] so tests can substitute a recording fake.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, debug_span, Instrument};
use uuid::Uuid;

use super::{ApiError, ApiRequest, Method};

/// Status line and body of an HTTP response, before envelope decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Only transport-level failures (connect, timeout,
    /// body read) are errors here; HTTP status codes are returned as-is.
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<RawResponse, ApiError>;
}

/// reqwest-backed transport used by the console.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gymhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let request_id = Uuid::new_v4();
        let span = debug_span!(
            "http",
            %request_id,
            method = request.method.as_str(),
            path = %request.path
        );
        self.dispatch(url, request, request_id).instrument(span).await
    }
}

impl HttpTransport {
    async fn dispatch(
        &self,
        url: &str,
        request: &ApiRequest,
        request_id: Uuid,
    ) -> Result<RawResponse, ApiError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        builder = builder.header("x-request-id", request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        debug!(status, "Response received");

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read response body: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}
