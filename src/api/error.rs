//! Remote service error types

use thiserror::Error;

/// Failure talking to the remote service, with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Server, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unknown, message)
    }

    /// Map a reqwest send/read failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Request timeout: {err}"))
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else if err.is_decode() || err.is_body() {
            Self::invalid_response(format!("Failed to read response: {err}"))
        } else {
            Self::unknown(format!("Request failed: {err}"))
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// No reply within the configured timeout
    Timeout,
    /// Credential rejected (401)
    Unauthorized,
    /// Non-success status other than 401
    Server,
    /// Body did not match the expected shape
    InvalidResponse,
    Unknown,
}

impl ApiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::Server => "server",
            Self::InvalidResponse => "invalid_response",
            Self::Unknown => "unknown",
        }
    }
}
