//! REST client for the gym backend.
//!
//! Every endpoint answers with the same envelope:
//! `{ success, data?, message?, pagination? }`. [`ApiClient::send`] turns that
//! envelope (or the lack of one) into an [`ApiResponse`] or an [`ApiError`].

pub mod endpoints;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod transport;
pub mod validation;

pub use error::{ApiError, ErrorCode, ErrorKind, ValidationError, ValidationErrorBuilder};
pub use transport::{HttpTransport, RawResponse, Transport};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::models::Pagination;
use crate::session::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Which part of the backend a path lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Role(Role),
    Public,
}

impl Scope {
    pub fn prefix(&self) -> &'static str {
        match self {
            Scope::Role(role) => role.api_prefix(),
            Scope::Public => "/public",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub scope: Scope,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn get(scope: Scope, path: impl Into<String>) -> Self {
        Self::new(Method::Get, scope, path)
    }

    pub fn post(scope: Scope, path: impl Into<String>) -> Self {
        Self::new(Method::Post, scope, path)
    }

    fn new(method: Method, scope: Scope, path: impl Into<String>) -> Self {
        Self {
            method,
            scope,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Malformed(format!("failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Decoded successful envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    /// The payload, for endpoints that must return one.
    pub fn require_data(self) -> Result<T, ApiError> {
        self.data
            .ok_or_else(|| ApiError::Malformed("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

/// Interpret a raw HTTP response according to the envelope contract.
///
/// A 5xx is always [`ApiError::Server`], envelope or not. Below that,
/// `success:false` wins over the HTTP status: a 401/403 with a body becomes
/// [`ApiError::InvalidToken`], anything else [`ApiError::Rejected`] carrying
/// the server's message. Bodies that are not an envelope become
/// [`ApiError::Server`] on non-2xx and [`ApiError::Malformed`] otherwise.
pub fn decode_envelope<T: DeserializeOwned>(raw: RawResponse) -> Result<ApiResponse<T>, ApiError> {
    if raw.status >= 500 {
        return Err(ApiError::Server {
            status: raw.status,
            body: raw.body,
        });
    }

    let envelope: Envelope = match serde_json::from_str(&raw.body) {
        Ok(envelope) => envelope,
        Err(e) if raw.is_success() => return Err(ApiError::Malformed(e.to_string())),
        Err(_) => {
            return Err(ApiError::Server {
                status: raw.status,
                body: raw.body,
            })
        }
    };

    if !envelope.success {
        let message = envelope.message.unwrap_or_default();
        return Err(if raw.status == 401 || raw.status == 403 {
            ApiError::InvalidToken { message }
        } else {
            ApiError::Rejected {
                status: raw.status,
                message,
            }
        });
    }

    if !raw.is_success() {
        return Err(ApiError::Server {
            status: raw.status,
            body: raw.body,
        });
    }

    let data = match envelope.data {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))?,
        ),
    };

    Ok(ApiResponse {
        data,
        message: envelope.message,
        pagination: envelope.pagination,
    })
}

/// Shared handle to the backend. Cheap to clone; created once at startup and
/// injected into every session, loader and controller.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    settings: ApiSettings,
}

impl ApiClient {
    /// Client backed by reqwest.
    pub fn new(settings: ApiSettings) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(settings.request_timeout)?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    pub fn with_transport(settings: ApiSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!(
            "{}{}{}",
            self.settings.base_url,
            request.scope.prefix(),
            request.path
        )
    }

    pub async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = self.url_for(&request);
        debug!(method = request.method.as_str(), url = %url, "Sending request");

        let raw = self.transport.execute(&url, &request).await?;
        let result = decode_envelope(raw);

        if let Err(e) = &result {
            debug!(url = %url, code = e.code().as_str(), "Request failed");
        }
        result
    }

    /// Like [`send`](Self::send) but gives up after `timeout`.
    pub async fn send_with_timeout<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        timeout: Duration,
    ) -> Result<ApiResponse<T>, ApiError> {
        match tokio::time::timeout(timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }

    /// Best-effort load: bounded by the soft timeout, and any failure yields
    /// `fallback` instead of an error.
    pub async fn fetch_or<T: DeserializeOwned>(&self, request: ApiRequest, fallback: T) -> T {
        let path = request.path.clone();
        match self
            .send_with_timeout::<T>(request, self.settings.soft_timeout)
            .await
        {
            Ok(response) => response.data.unwrap_or(fallback),
            Err(e) => {
                warn!(path = %path, error = %e, "Best-effort load failed, using fallback");
                fallback
            }
        }
    }
}
