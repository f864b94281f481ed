//! Remote Wine-AI service boundary
//!
//! Every call returns a tagged outcome instead of a `Result`: callers branch
//! on what happened, never on the shape of a JSON payload.

mod error;
mod http;
mod types;

pub use error::{ApiError, ApiErrorKind};
pub use http::{HttpWineApi, Timeouts};
pub use types::{QueryOutcome, ServerMode, TokenRequestOutcome};

use crate::credential::Credential;
use async_trait::async_trait;
use std::sync::Arc;

/// Calls the session makes against the remote service
#[async_trait]
pub trait WineApi: Send + Sync {
    /// `POST /api/request-token`
    async fn request_token(&self, email: &str) -> TokenRequestOutcome;

    /// `POST /api/query` with the credential attached
    async fn query(&self, text: &str, credential: &Credential) -> QueryOutcome;

    /// `GET /api/status`; unreachable servers report [`ServerMode::Unknown`]
    async fn status(&self) -> ServerMode;
}

#[async_trait]
impl<T: WineApi + ?Sized> WineApi for Arc<T> {
    async fn request_token(&self, email: &str) -> TokenRequestOutcome {
        (**self).request_token(email).await
    }

    async fn query(&self, text: &str, credential: &Credential) -> QueryOutcome {
        (**self).query(text, credential).await
    }

    async fn status(&self) -> ServerMode {
        (**self).status().await
    }
}

/// Logging wrapper for remote calls
pub struct LoggingApi<A> {
    inner: A,
}

impl<A: WineApi> LoggingApi<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: WineApi> WineApi for LoggingApi<A> {
    async fn request_token(&self, email: &str) -> TokenRequestOutcome {
        let start = std::time::Instant::now();
        let outcome = self.inner.request_token(email).await;
        let duration = start.elapsed();

        match &outcome {
            TokenRequestOutcome::RequestFailed { reason } => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    error = %reason,
                    "Token request failed"
                );
            }
            other => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    outcome = other.label(),
                    "Token request completed"
                );
            }
        }

        outcome
    }

    async fn query(&self, text: &str, credential: &Credential) -> QueryOutcome {
        let start = std::time::Instant::now();
        let outcome = self.inner.query(text, credential).await;
        let duration = start.elapsed();

        match &outcome {
            QueryOutcome::Answered { text: answer } => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    query_chars = text.chars().count(),
                    answer_chars = answer.chars().count(),
                    "Query answered"
                );
            }
            QueryOutcome::Unauthorized => {
                tracing::warn!(duration_ms = %duration.as_millis(), "Query rejected: token invalid");
            }
            QueryOutcome::TransportFailed { reason } => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    error = %reason,
                    "Query failed"
                );
            }
        }

        outcome
    }

    async fn status(&self) -> ServerMode {
        let mode = self.inner.status().await;
        tracing::info!(mode = ?mode, "Server status");
        mode
    }
}
