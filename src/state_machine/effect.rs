//! Effects produced by state transitions

use crate::conversation::Origin;
use crate::credential::Credential;

/// Out-of-band notices for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    CredentialConfirmed,
    CredentialInvalidated,
    SignedOut,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the conversation log
    AppendMessage { origin: Origin, text: String },

    /// Write the confirmed credential to the token store
    SaveCredential { credential: Credential },

    /// Remove the credential from the token store
    ClearCredential,

    /// Issue the request-token call (spawns as background task)
    RequestToken { email: String },

    /// Issue the query call (spawns as background task)
    SendQuery { text: String, credential: Credential },

    /// Tell the presentation layer something happened
    Notify { notice: Notice },
}

impl Effect {
    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            origin: Origin::User,
            text: text.into(),
        }
    }

    pub fn assistant_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            origin: Origin::Assistant,
            text: text.into(),
        }
    }

    pub fn notify(notice: Notice) -> Self {
        Effect::Notify { notice }
    }
}
