//! Events that can occur in a session

use crate::api::{QueryOutcome, TokenRequestOutcome};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    EmailSubmitted { email: String },
    DeliveredTokenEntered { token: String },
    DisplayedTokenConfirmed,
    QuerySubmitted { text: String },
    SignOut,

    // Service events
    TokenRequestCompleted { outcome: TokenRequestOutcome },
    QueryCompleted { outcome: QueryOutcome },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::EmailSubmitted { .. } => "email_submitted",
            Event::DeliveredTokenEntered { .. } => "delivered_token_entered",
            Event::DisplayedTokenConfirmed => "displayed_token_confirmed",
            Event::QuerySubmitted { .. } => "query_submitted",
            Event::SignOut => "sign_out",
            Event::TokenRequestCompleted { .. } => "token_request_completed",
            Event::QueryCompleted { .. } => "query_completed",
        }
    }
}
