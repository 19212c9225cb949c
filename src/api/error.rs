//! Unified client-side error handling.
//!
//! Every failure a page can hit is an [`ApiError`]. Each one maps to an
//! [`ErrorCode`] (machine-readable) and an [`ErrorKind`] that tells the caller
//! what to do: redirect to login, show a transient banner, show the server's
//! message, or block the submit.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Shown when the server gave no message of its own.
pub const GENERIC_CONNECTIVITY_MESSAGE: &str =
    "Không thể kết nối tới máy chủ. Vui lòng kiểm tra kết nối và thử lại.";

/// Error codes for client failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Session
    MissingToken,
    InvalidToken,

    // Transport
    NetworkError,
    Timeout,

    // Server
    ServerRejected,
    ServerError,
    MalformedResponse,

    // Client-side
    ValidationError,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingToken => "missing_token",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::ServerRejected => "server_rejected",
            ErrorCode::ServerError => "server_error",
            ErrorCode::MalformedResponse => "malformed_response",
            ErrorCode::ValidationError => "validation_error",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::MissingToken | ErrorCode::InvalidToken => ErrorKind::Auth,
            ErrorCode::NetworkError | ErrorCode::Timeout => ErrorKind::Network,
            ErrorCode::ServerRejected | ErrorCode::ServerError | ErrorCode::MalformedResponse => {
                ErrorKind::ServerRejected
            }
            ErrorCode::ValidationError => ErrorKind::Validation,
        }
    }
}

/// How a page reacts to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Redirect to the role's login route and clear stale storage
    Auth,
    /// Stay on the page, show a transient banner, touch nothing
    Network,
    /// Show the server's message; the cached collection stays as it was
    ServerRejected,
    /// Blocked before any request was sent
    Validation,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no session token stored")]
    MissingToken,

    #[error("session rejected by server: {message}")]
    InvalidToken { message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::MissingToken => ErrorCode::MissingToken,
            ApiError::InvalidToken { .. } => ErrorCode::InvalidToken,
            ApiError::Network(_) => ErrorCode::NetworkError,
            ApiError::Timeout(_) => ErrorCode::Timeout,
            ApiError::Rejected { .. } => ErrorCode::ServerRejected,
            ApiError::Server { .. } => ErrorCode::ServerError,
            ApiError::Malformed(_) => ErrorCode::MalformedResponse,
            ApiError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// Text for the dismissible banner: the server's own message when it sent
    /// one, otherwise a generic connectivity message.
    pub fn banner_message(&self) -> String {
        match self {
            ApiError::InvalidToken { message } | ApiError::Rejected { message, .. }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            ApiError::MissingToken | ApiError::InvalidToken { .. } => {
                "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.".to_string()
            }
            ApiError::Validation(v) => v.to_string(),
            _ => GENERIC_CONNECTIVITY_MESSAGE.to_string(),
        }
    }
}

/// Client-side validation failure, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(fields: BTreeMap<String, Vec<String>>) -> Self {
        let message = if fields.len() == 1 {
            fields
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", fields.len())
        };
        Self { message, fields }
    }

    /// Single field validation error
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), vec![message.into()]);
        Self::new(fields)
    }
}

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the error of a `validate_*` helper under `field`, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Return Ok(()) if no errors, or the collected ValidationError
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }
}
