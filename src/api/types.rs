//! Outcomes and wire types for the remote service

use super::{ApiError, ApiErrorKind};
use serde::{Deserialize, Serialize};

/// Result of `POST /api/request-token`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequestOutcome {
    /// The service returned the token in the response (no e-mail delivery configured)
    DirectToken {
        token: String,
        message: Option<String>,
    },
    /// The service e-mailed the token
    EmailSent,
    RequestFailed { reason: String },
}

impl TokenRequestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectToken { .. } => "direct_token",
            Self::EmailSent => "email_sent",
            Self::RequestFailed { .. } => "request_failed",
        }
    }
}

impl From<Result<TokenRequestOutcome, ApiError>> for TokenRequestOutcome {
    fn from(result: Result<TokenRequestOutcome, ApiError>) -> Self {
        result.unwrap_or_else(|e| Self::RequestFailed { reason: e.message })
    }
}

/// Result of `POST /api/query`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered { text: String },
    /// The credential was rejected; never treated as a transport fault
    Unauthorized,
    TransportFailed { reason: String },
}

impl QueryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Answered { .. } => "answered",
            Self::Unauthorized => "unauthorized",
            Self::TransportFailed { .. } => "transport_failed",
        }
    }
}

impl From<Result<String, ApiError>> for QueryOutcome {
    fn from(result: Result<String, ApiError>) -> Self {
        match result {
            Ok(text) => Self::Answered { text },
            Err(e) if e.kind == ApiErrorKind::Unauthorized => Self::Unauthorized,
            Err(e) => Self::TransportFailed { reason: e.message },
        }
    }
}

/// Server mode reported by `GET /api/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Live,
    DryRun,
    Unknown,
}

impl ServerMode {
    pub fn parse(mode: &str) -> Self {
        match mode {
            "live" => Self::Live,
            "dry-run" => Self::DryRun,
            _ => Self::Unknown,
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
pub(super) struct TokenRequestBody<'a> {
    pub email: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenRequestResponse {
    #[serde(default)]
    pub display_token: bool,
    pub token: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct QueryBody<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusResponse {
    pub mode: String,
}

/// FastAPI error body
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub detail: serde_json::Value,
}
