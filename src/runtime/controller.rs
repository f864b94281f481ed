//! Session controller: owns the state, the log, and the effect loop

use crate::api::{QueryOutcome, ServerMode, TokenRequestOutcome, WineApi};
use crate::conversation::{ConversationLog, Message};
#[cfg(test)]
use crate::credential::Credential;
use crate::locale::Locale;
use crate::state_machine::{
    transition, AcquisitionState, Effect, Event, Notice, SessionContext, SessionState,
    TransitionError, View,
};
use crate::token_store::TokenStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Drives one interactive session against the remote service
pub struct SessionController<S, A> {
    context: SessionContext,
    state: SessionState,
    log: ConversationLog,
    notices: Vec<Notice>,
    store: S,
    api: Arc<A>,
    event_tx: mpsc::Sender<Event>,
    event_rx: mpsc::Receiver<Event>,
    query_started: Option<Instant>,
}

impl<S, A> SessionController<S, A>
where
    S: TokenStore,
    A: WineApi + 'static,
{
    /// Create a controller, reading the token store exactly once
    pub fn new(context: SessionContext, store: S, api: A) -> Self {
        let stored = match store.load() {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored token, starting without one");
                None
            }
        };
        tracing::info!(
            has_credential = stored.is_some(),
            locale = context.locale.tag(),
            "Starting session"
        );

        let (event_tx, event_rx) = mpsc::channel(32);
        Self {
            context,
            state: SessionState::from_stored(stored),
            log: ConversationLog::new(),
            notices: Vec::new(),
            store,
            api: Arc::new(api),
            event_tx,
            event_rx,
            query_started: None,
        }
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Submit a query. Dropped silently without a credential, while another
    /// query is pending, or when the text is blank.
    pub fn submit(&mut self, text: &str) {
        if let Err(e) = self.dispatch(Event::QuerySubmitted {
            text: text.to_string(),
        }) {
            if e.is_dropped_submission() {
                tracing::debug!(reason = %e, "Query submission dropped");
            } else {
                tracing::warn!(error = %e, "Unexpected query rejection");
            }
        }
    }

    /// Start (or restart) the acquisition flow with an e-mail address
    pub fn submit_email(&mut self, email: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::EmailSubmitted {
            email: email.to_string(),
        })
    }

    /// Confirm the token the user received by e-mail
    pub fn enter_delivered_token(&mut self, token: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::DeliveredTokenEntered {
            token: token.to_string(),
        })
    }

    /// Confirm the token the service returned in its response
    pub fn confirm_displayed_token(&mut self) -> Result<(), TransitionError> {
        self.dispatch(Event::DisplayedTokenConfirmed)
    }

    /// Forget the credential and return to the e-mail prompt
    pub fn sign_out(&mut self) -> Result<(), TransitionError> {
        self.dispatch(Event::SignOut)
    }

    /// Ask the service whether it answers for real or in dry-run mode
    pub async fn server_mode(&self) -> ServerMode {
        self.api.status().await
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn view(&self) -> View {
        self.state.view()
    }

    pub fn acquisition(&self) -> Option<&AcquisitionState> {
        self.state.acquisition()
    }

    #[cfg(test)]
    pub fn credential(&self) -> Option<&Credential> {
        self.state.credential()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    /// Drives the "thinking" indicator
    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn locale(&self) -> Locale {
        self.context.locale
    }

    /// Take notices raised since the last call
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether a remote call is outstanding
    pub fn has_outstanding_call(&self) -> bool {
        self.state.is_pending() || self.state.is_requesting_token()
    }

    // ========================================================================
    // Completions
    // ========================================================================

    /// Wait for the next remote call to complete
    pub async fn next_completion(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Apply a completion event produced by a spawned call
    pub fn handle_completion(&mut self, event: Event) {
        if let Err(e) = self.dispatch(event) {
            tracing::warn!(error = %e, "Ignoring stray completion");
        }
    }

    /// Apply completions until no remote call is outstanding
    pub async fn settle(&mut self) {
        while self.has_outstanding_call() {
            match self.next_completion().await {
                Some(event) => self.handle_completion(event),
                None => break,
            }
        }
    }

    // ========================================================================
    // Effect Loop
    // ========================================================================

    fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();
        if let Event::QueryCompleted { outcome } = &event {
            if let Some(started) = self.query_started.take() {
                tracing::debug!(
                    elapsed_ms = %started.elapsed().as_millis(),
                    outcome = outcome.label(),
                    "Query settled"
                );
            }
        }

        let result = transition(&self.state, &self.context, event)?;
        let old_view = self.state.view();
        self.state = result.new_state;

        if old_view != self.state.view() {
            tracing::info!(event = event_name, view = ?self.state.view(), "View changed");
        } else {
            tracing::debug!(event = event_name, "Transition applied");
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { origin, text } => {
                self.log.append(origin, text);
            }

            Effect::SaveCredential { credential } => {
                if let Err(e) = self.store.save(&credential) {
                    tracing::warn!(error = %e, "Failed to persist token");
                }
            }

            Effect::ClearCredential => {
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "Failed to clear stored token");
                }
            }

            Effect::RequestToken { email } => {
                let api = self.api.clone();
                self.spawn_call(
                    async move {
                        let outcome = api.request_token(&email).await;
                        Event::TokenRequestCompleted { outcome }
                    },
                    |reason| Event::TokenRequestCompleted {
                        outcome: TokenRequestOutcome::RequestFailed { reason },
                    },
                );
            }

            Effect::SendQuery { text, credential } => {
                self.query_started = Some(Instant::now());
                let api = self.api.clone();
                self.spawn_call(
                    async move {
                        let outcome = api.query(&text, &credential).await;
                        Event::QueryCompleted { outcome }
                    },
                    |reason| Event::QueryCompleted {
                        outcome: QueryOutcome::TransportFailed { reason },
                    },
                );
            }

            Effect::Notify { notice } => {
                self.notices.push(notice);
            }
        }
    }

    /// Spawn a remote call; a panicked or aborted task still reports back,
    /// so a pending marker is always released
    fn spawn_call<F, R>(&self, call: F, on_failure: R)
    where
        F: Future<Output = Event> + Send + 'static,
        R: FnOnce(String) -> Event + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(call);

        tokio::spawn(async move {
            let event = match handle.await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Remote call task failed");
                    on_failure(e.to_string())
                }
            };
            if event_tx.send(event).await.is_err() {
                tracing::debug!("Session closed before completion was delivered");
            }
        });
    }
}
