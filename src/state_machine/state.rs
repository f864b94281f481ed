//! Session state types

use crate::credential::Credential;
use crate::locale::Locale;

// ============================================================================
// Acquisition Flow
// ============================================================================

/// Where the user is on the way from "no token" to "confirmed token"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionState {
    /// Initial state: waiting for an e-mail address
    AwaitingEmail {
        /// Form error from the last failed request, if any
        error: Option<String>,
    },

    /// Request-token call in flight; further submissions are rejected
    RequestingToken { email: String },

    /// Token was e-mailed; waiting for the user to type it in
    AwaitingDeliveredToken { email: String, notice: String },

    /// Token came back in the response; waiting for the user to continue
    TokenDisplayedForConfirmation { token: Credential, notice: String },

    /// A confirmed credential was rejected by the service
    Failed { reason: String },
}

impl Default for AcquisitionState {
    fn default() -> Self {
        AcquisitionState::AwaitingEmail { error: None }
    }
}

impl AcquisitionState {
    /// Whether an e-mail submission is accepted in this state
    pub fn accepts_email(&self) -> bool {
        matches!(
            self,
            AcquisitionState::AwaitingEmail { .. }
                | AcquisitionState::AwaitingDeliveredToken { .. }
                | AcquisitionState::Failed { .. }
        )
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Marker for the one query awaiting a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub query: String,
}

/// Which surface the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Acquisition,
    Conversation,
}

/// Session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No usable credential; the acquisition flow is active
    Acquiring(AcquisitionState),

    /// Credential held; queries may be dispatched
    Ready {
        credential: Credential,
        pending: Option<PendingRequest>,
    },
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Acquiring(AcquisitionState::default())
    }
}

impl SessionState {
    /// Initial state given whatever the token store held at startup
    pub fn from_stored(credential: Option<Credential>) -> Self {
        match credential {
            Some(credential) => SessionState::Ready {
                credential,
                pending: None,
            },
            None => SessionState::default(),
        }
    }

    pub fn view(&self) -> View {
        match self {
            SessionState::Acquiring(_) => View::Acquisition,
            SessionState::Ready { .. } => View::Conversation,
        }
    }

    #[cfg(test)]
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::Ready { credential, .. } => Some(credential),
            SessionState::Acquiring(_) => None,
        }
    }

    pub fn acquisition(&self) -> Option<&AcquisitionState> {
        match self {
            SessionState::Acquiring(acq) => Some(acq),
            SessionState::Ready { .. } => None,
        }
    }

    /// Check if a query is awaiting a reply
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Ready { pending: Some(_), .. })
    }

    /// Check if a request-token call is in flight
    pub fn is_requesting_token(&self) -> bool {
        matches!(
            self,
            SessionState::Acquiring(AcquisitionState::RequestingToken { .. })
        )
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionContext {
    pub locale: Locale,
}

impl SessionContext {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }
}
