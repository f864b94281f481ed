//! reqwest client for the Wine-AI HTTP endpoints

use super::types::{
    ErrorBody, QueryBody, QueryResponse, StatusResponse, TokenRequestBody, TokenRequestResponse,
};
use super::{ApiError, QueryOutcome, ServerMode, TokenRequestOutcome, WineApi};
use crate::credential::Credential;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Header carrying the access token on queries
pub const TOKEN_HEADER: &str = "X-API-Token";

/// Per-endpoint request timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub token_request: Duration,
    pub query: Duration,
    pub status: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            token_request: Duration::from_secs(30),
            query: Duration::from_secs(60),
            status: Duration::from_secs(5),
        }
    }
}

/// HTTP implementation of [`WineApi`]
pub struct HttpWineApi {
    client: Client,
    base_url: String,
    timeouts: Timeouts,
}

impl HttpWineApi {
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("sommelier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify_error(status: StatusCode, body: &str) -> ApiError {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map_or_else(|| body.to_string(), |b| detail_text(&b.detail));
        match status.as_u16() {
            401 => ApiError::unauthorized(format!("Token rejected: {detail}")),
            500..=599 => ApiError::server_error(format!("Server error: {detail}")),
            _ => ApiError::unknown(format!("HTTP {status}: {detail}")),
        }
    }

    async fn post_request_token(&self, email: &str) -> Result<TokenRequestOutcome, ApiError> {
        let response = self
            .client
            .post(self.url("/api/request-token"))
            .timeout(self.timeouts.token_request)
            .json(&TokenRequestBody { email })
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        // Anything without `display_token: true` is the e-mail acknowledgement
        match serde_json::from_str::<TokenRequestResponse>(&body) {
            Ok(TokenRequestResponse {
                display_token: true,
                token,
                message,
            }) => match token {
                Some(token) if !token.trim().is_empty() => {
                    Ok(TokenRequestOutcome::DirectToken { token, message })
                }
                _ => Err(ApiError::invalid_response(
                    "display_token set but no token in response",
                )),
            },
            _ => Ok(TokenRequestOutcome::EmailSent),
        }
    }

    async fn post_query(&self, text: &str, credential: &Credential) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/api/query"))
            .timeout(self.timeouts.query)
            .header(TOKEN_HEADER, credential.as_str())
            .json(&QueryBody { query: text })
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        // Status is inspected before the body so a 401 is never a transport fault
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let parsed: QueryResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::invalid_response(format!("Failed to parse answer: {e} - body: {body}"))
        })?;
        Ok(parsed.answer)
    }

    async fn get_status(&self) -> Result<ServerMode, ApiError> {
        let response = self
            .client
            .get(self.url("/api/status"))
            .timeout(self.timeouts.status)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::from_transport(&e))?;
            return Err(Self::classify_error(status, &body));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| ApiError::invalid_response(format!("Failed to parse status: {e}")))?;
        Ok(ServerMode::parse(&parsed.mode))
    }
}

#[async_trait]
impl WineApi for HttpWineApi {
    async fn request_token(&self, email: &str) -> TokenRequestOutcome {
        self.post_request_token(email).await.into()
    }

    async fn query(&self, text: &str, credential: &Credential) -> QueryOutcome {
        self.post_query(text, credential).await.into()
    }

    async fn status(&self) -> ServerMode {
        match self.get_status().await {
            Ok(mode) => mode,
            Err(e) => {
                tracing::warn!(kind = e.kind.as_str(), error = %e, "Could not get server status");
                ServerMode::Unknown
            }
        }
    }
}

fn detail_text(detail: &serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
