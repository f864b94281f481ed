//! Pure state transition function
//!
//! Acquisition flow and query dispatch are both expressed here. The
//! function performs no I/O; the controller executes the returned effects.

use super::effect::Notice;
use super::state::{AcquisitionState, PendingRequest};
use super::{Effect, Event, SessionContext, SessionState};
use crate::api::{QueryOutcome, TokenRequestOutcome};
use crate::credential::{validate_email, validate_query, Credential, ValidationError};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No credential held, query dropped")]
    NotAuthenticated,
    #[error("A query is already awaiting a reply")]
    QueryInFlight,
    #[error("A token request is already in flight")]
    TokenRequestInFlight,
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Submissions dropped by the single-flight or gating rules
    pub fn is_dropped_submission(&self) -> bool {
        matches!(
            self,
            TransitionError::NotAuthenticated
                | TransitionError::QueryInFlight
                | TransitionError::Validation(ValidationError::EmptyQuery)
        )
    }
}

fn ready(credential: Credential) -> SessionState {
    SessionState::Ready {
        credential,
        pending: None,
    }
}

fn acquiring(state: AcquisitionState) -> SessionState {
    SessionState::Acquiring(state)
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let locale = context.locale;

    match (state, event) {
        // ============================================================
        // Token Acquisition
        // ============================================================

        // Single flight for the request-token call
        (
            SessionState::Acquiring(AcquisitionState::RequestingToken { .. }),
            Event::EmailSubmitted { .. },
        ) => Err(TransitionError::TokenRequestInFlight),

        // AwaitingEmail / AwaitingDeliveredToken / Failed + EmailSubmitted -> RequestingToken
        (SessionState::Acquiring(acq), Event::EmailSubmitted { email }) if acq.accepts_email() => {
            let email = validate_email(&email)?;
            Ok(
                TransitionResult::new(acquiring(AcquisitionState::RequestingToken {
                    email: email.clone(),
                }))
                .with_effect(Effect::RequestToken { email }),
            )
        }

        // RequestingToken + TokenRequestCompleted -> next step depends on delivery
        (
            SessionState::Acquiring(AcquisitionState::RequestingToken { email }),
            Event::TokenRequestCompleted { outcome },
        ) => {
            let next = match outcome {
                TokenRequestOutcome::DirectToken { token, message } => {
                    match Credential::from_service(&token) {
                        Ok(token) => AcquisitionState::TokenDisplayedForConfirmation {
                            token,
                            notice: message
                                .filter(|m| !m.trim().is_empty())
                                .unwrap_or_else(|| locale.token_displayed().to_string()),
                        },
                        Err(_) => AcquisitionState::AwaitingEmail {
                            error: Some(locale.token_request_failed().to_string()),
                        },
                    }
                }
                TokenRequestOutcome::EmailSent => AcquisitionState::AwaitingDeliveredToken {
                    email: email.clone(),
                    notice: locale.token_sent_by_email(email),
                },
                TokenRequestOutcome::RequestFailed { .. } => AcquisitionState::AwaitingEmail {
                    error: Some(locale.token_request_failed().to_string()),
                },
            };
            Ok(TransitionResult::new(acquiring(next)))
        }

        // AwaitingDeliveredToken + DeliveredTokenEntered -> Ready
        (
            SessionState::Acquiring(AcquisitionState::AwaitingDeliveredToken { .. }),
            Event::DeliveredTokenEntered { token },
        ) => {
            let credential = Credential::from_delivered(&token)?;
            Ok(confirm(credential))
        }

        // TokenDisplayedForConfirmation + DisplayedTokenConfirmed -> Ready
        (
            SessionState::Acquiring(AcquisitionState::TokenDisplayedForConfirmation { token, .. }),
            Event::DisplayedTokenConfirmed,
        ) => Ok(confirm(token.clone())),

        // ============================================================
        // Query Dispatch
        // ============================================================

        // Gating: no credential, no query
        (SessionState::Acquiring(_), Event::QuerySubmitted { .. }) => {
            Err(TransitionError::NotAuthenticated)
        }

        // Single flight: drop, do not queue
        (
            SessionState::Ready {
                pending: Some(_), ..
            },
            Event::QuerySubmitted { .. },
        ) => Err(TransitionError::QueryInFlight),

        // Ready + QuerySubmitted -> Ready with pending; user message precedes the call
        (
            SessionState::Ready {
                credential,
                pending: None,
            },
            Event::QuerySubmitted { text },
        ) => {
            validate_query(&text)?;
            Ok(TransitionResult::new(SessionState::Ready {
                credential: credential.clone(),
                pending: Some(PendingRequest {
                    query: text.clone(),
                }),
            })
            .with_effect(Effect::user_message(text.clone()))
            .with_effect(Effect::SendQuery {
                text,
                credential: credential.clone(),
            }))
        }

        // Pending + QueryCompleted -> classify
        (
            SessionState::Ready {
                credential,
                pending: Some(_),
            },
            Event::QueryCompleted { outcome },
        ) => Ok(match outcome {
            QueryOutcome::Answered { text } => {
                TransitionResult::new(ready(credential.clone()))
                    .with_effect(Effect::assistant_message(text))
            }
            QueryOutcome::TransportFailed { .. } => {
                TransitionResult::new(ready(credential.clone()))
                    .with_effect(Effect::assistant_message(locale.query_failed()))
            }
            QueryOutcome::Unauthorized => TransitionResult::new(acquiring(
                AcquisitionState::Failed {
                    reason: locale.token_expired().to_string(),
                },
            ))
            .with_effect(Effect::ClearCredential)
            .with_effect(Effect::assistant_message(locale.token_expired()))
            .with_effect(Effect::notify(Notice::CredentialInvalidated)),
        }),

        // ============================================================
        // Sign Out
        // ============================================================
        (
            SessionState::Ready {
                pending: Some(_), ..
            },
            Event::SignOut,
        ) => Err(TransitionError::QueryInFlight),

        (SessionState::Ready { pending: None, .. }, Event::SignOut) => Ok(TransitionResult::new(
            acquiring(AcquisitionState::default()),
        )
        .with_effect(Effect::ClearCredential)
        .with_effect(Effect::notify(Notice::SignedOut))),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {}",
            event.name()
        ))),
    }
}

/// Any terminal acquisition path ends here
fn confirm(credential: Credential) -> TransitionResult {
    TransitionResult::new(ready(credential.clone()))
        .with_effect(Effect::SaveCredential { credential })
        .with_effect(Effect::notify(Notice::CredentialConfirmed))
}
