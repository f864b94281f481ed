//! Access credential and boundary validation
//!
//! Every token that enters the session goes through [`Credential`], which
//! stores it uppercase so the same token typed in either case is one value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a token typed in by the user after e-mail delivery
pub const DELIVERED_TOKEN_MAX_LEN: usize = 6;

/// Input rejected before any network call is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query text is empty")]
    EmptyQuery,
    #[error("email address is empty")]
    EmptyEmail,
    #[error("email address is malformed: {0}")]
    MalformedEmail(String),
    #[error("token is empty")]
    EmptyToken,
    #[error("token is longer than {max} characters")]
    TokenTooLong { max: usize },
}

/// The opaque access token attached to every query
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Normalize a token returned directly by the service.
    pub fn from_service(token: &str) -> Result<Self, ValidationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        Ok(Self(token.to_uppercase()))
    }

    /// Normalize a token the user typed after out-of-band delivery.
    pub fn from_delivered(token: &str) -> Result<Self, ValidationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        if token.chars().count() > DELIVERED_TOKEN_MAX_LEN {
            return Err(ValidationError::TokenTooLong {
                max: DELIVERED_TOKEN_MAX_LEN,
            });
        }
        Ok(Self(token.to_uppercase()))
    }

    /// Rebuild a credential read back from durable storage.
    pub fn from_stored(token: &str) -> Option<Self> {
        Self::from_service(token).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of debug logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"***").finish()
    }
}

/// Validate and trim an e-mail address for the request-token call.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(ValidationError::MalformedEmail(email.to_string())),
    }
}

/// Validate query text; the text itself is sent untrimmed.
pub fn validate_query(text: &str) -> Result<&str, ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::EmptyQuery)
    } else {
        Ok(text)
    }
}
