//! Mock implementations for testing
//!
//! These mocks enable session-level testing without real I/O.

use crate::api::{QueryOutcome, ServerMode, TokenRequestOutcome, WineApi};
use crate::credential::Credential;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Wine API
// ============================================================================

/// Mock service that returns queued outcomes and records every call
pub struct MockWineApi {
    token_outcomes: Mutex<VecDeque<TokenRequestOutcome>>,
    query_outcomes: Mutex<VecDeque<QueryOutcome>>,
    mode: ServerMode,
    /// E-mail addresses passed to `request_token`
    pub token_requests: Mutex<Vec<String>>,
    /// Query text and credential of every `query` call
    pub queries: Mutex<Vec<(String, Credential)>>,
}

impl MockWineApi {
    pub fn new() -> Self {
        Self {
            token_outcomes: Mutex::new(VecDeque::new()),
            query_outcomes: Mutex::new(VecDeque::new()),
            mode: ServerMode::Live,
            token_requests: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn queue_token_outcome(&self, outcome: TokenRequestOutcome) {
        self.token_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn queue_answer(&self, text: impl Into<String>) {
        self.queue_query_outcome(QueryOutcome::Answered { text: text.into() });
    }

    pub fn queue_query_outcome(&self, outcome: QueryOutcome) {
        self.query_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn recorded_token_requests(&self) -> Vec<String> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn recorded_queries(&self) -> Vec<(String, Credential)> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockWineApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WineApi for MockWineApi {
    async fn request_token(&self, email: &str) -> TokenRequestOutcome {
        self.token_requests.lock().unwrap().push(email.to_string());
        self.token_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TokenRequestOutcome::RequestFailed {
                reason: "No mock outcome queued".to_string(),
            })
    }

    async fn query(&self, text: &str, credential: &Credential) -> QueryOutcome {
        self.queries
            .lock()
            .unwrap()
            .push((text.to_string(), credential.clone()));
        self.query_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| QueryOutcome::TransportFailed {
                reason: "No mock outcome queued".to_string(),
            })
    }

    async fn status(&self) -> ServerMode {
        self.mode
    }
}

// ============================================================================
// Delayed Mock Wine API (for in-flight testing)
// ============================================================================

/// Mock service whose calls take a configurable time
pub struct DelayedMockWineApi {
    inner: MockWineApi,
    delay: Duration,
    /// Notified when a call starts (for test synchronization)
    pub call_started: Arc<Notify>,
}

impl DelayedMockWineApi {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockWineApi::new(),
            delay,
            call_started: Arc::new(Notify::new()),
        }
    }

    pub fn inner(&self) -> &MockWineApi {
        &self.inner
    }
}

#[async_trait]
impl WineApi for DelayedMockWineApi {
    async fn request_token(&self, email: &str) -> TokenRequestOutcome {
        self.call_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.request_token(email).await
    }

    async fn query(&self, text: &str, credential: &Credential) -> QueryOutcome {
        self.call_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.query(text, credential).await
    }

    async fn status(&self) -> ServerMode {
        self.inner.status().await
    }
}

// ============================================================================
// Panicking Mock Wine API (for task supervision testing)
// ============================================================================

/// Mock service whose calls panic mid-flight
pub struct PanickingWineApi;

#[async_trait]
impl WineApi for PanickingWineApi {
    async fn request_token(&self, _email: &str) -> TokenRequestOutcome {
        panic!("request_token blew up");
    }

    async fn query(&self, _text: &str, _credential: &Credential) -> QueryOutcome {
        panic!("query blew up");
    }

    async fn status(&self) -> ServerMode {
        ServerMode::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Origin;
    use crate::locale::Locale;
    use crate::runtime::SessionController;
    use crate::state_machine::{AcquisitionState, Notice, SessionContext, View};
    use crate::token_store::{MemoryTokenStore, TokenStore};

    fn cred(token: &str) -> Credential {
        Credential::from_service(token).unwrap()
    }

    fn signed_in_store() -> Arc<MemoryTokenStore> {
        Arc::new(MemoryTokenStore::with_credential(cred("AB12CD")))
    }

    fn controller<A: WineApi + 'static>(
        store: &Arc<MemoryTokenStore>,
        api: A,
    ) -> SessionController<Arc<MemoryTokenStore>, A> {
        SessionController::new(SessionContext::new(Locale::En), store.clone(), api)
    }

    #[tokio::test]
    async fn test_mock_wine_api() {
        let mock = MockWineApi::new().with_mode(ServerMode::DryRun);
        mock.queue_answer("Try a Malbec.");

        let outcome = mock.query("steak?", &cred("ab12cd")).await;
        assert_eq!(
            outcome,
            QueryOutcome::Answered {
                text: "Try a Malbec.".to_string()
            }
        );
        assert_eq!(mock.status().await, ServerMode::DryRun);
        assert_eq!(mock.recorded_queries()[0].1.as_str(), "AB12CD");

        // Empty queue reads as a transport failure
        assert!(matches!(
            mock.query("again", &cred("ab12cd")).await,
            QueryOutcome::TransportFailed { .. }
        ));
    }

    // ========================================================================
    // Startup
    // ========================================================================

    #[tokio::test]
    async fn test_startup_follows_store() {
        let empty = Arc::new(MemoryTokenStore::new());
        assert_eq!(controller(&empty, MockWineApi::new()).view(), View::Acquisition);

        let stored = signed_in_store();
        let session = controller(&stored, MockWineApi::new());
        assert_eq!(session.view(), View::Conversation);
        assert_eq!(session.credential(), Some(&cred("AB12CD")));
        assert!(session.messages().is_empty());
    }

    // ========================================================================
    // Acquisition scenarios
    // ========================================================================

    // Scenario A: token displayed in the response, then confirmed
    #[tokio::test]
    async fn test_direct_token_flow() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = MockWineApi::new();
        api.queue_token_outcome(TokenRequestOutcome::DirectToken {
            token: "xy12ab".to_string(),
            message: None,
        });
        let mut session = controller(&store, api);

        session.submit_email("a@b.com").unwrap();
        assert!(session.has_outstanding_call());
        session.settle().await;

        match session.acquisition() {
            Some(AcquisitionState::TokenDisplayedForConfirmation { token, .. }) => {
                assert_eq!(token.as_str(), "XY12AB");
            }
            other => panic!("unexpected acquisition state {other:?}"),
        }
        // Not persisted until the user continues
        assert_eq!(store.load().unwrap(), None);

        session.confirm_displayed_token().unwrap();
        assert_eq!(session.view(), View::Conversation);
        assert_eq!(store.load().unwrap(), Some(cred("XY12AB")));
        assert_eq!(session.drain_notices(), vec![Notice::CredentialConfirmed]);
        assert!(session.drain_notices().is_empty());
    }

    // P4: delivered tokens are stored uppercase whatever the input case
    #[tokio::test]
    async fn test_delivered_token_is_normalized() {
        for typed in ["ab12cd", "AB12CD", "  aB12cD "] {
            let store = Arc::new(MemoryTokenStore::new());
            let api = MockWineApi::new();
            api.queue_token_outcome(TokenRequestOutcome::EmailSent);
            let mut session = controller(&store, api);

            session.submit_email("a@b.com").unwrap();
            session.settle().await;
            assert!(matches!(
                session.acquisition(),
                Some(AcquisitionState::AwaitingDeliveredToken { .. })
            ));

            session.enter_delivered_token(typed).unwrap();
            assert_eq!(store.load().unwrap(), Some(cred("AB12CD")));
        }
    }

    #[tokio::test]
    async fn test_invalid_email_makes_no_call() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = Arc::new(MockWineApi::new());
        let mut session = controller(&store, api.clone());

        assert!(session.submit_email("not-an-email").is_err());
        assert!(!session.has_outstanding_call());
        assert!(api.recorded_token_requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_token_request_allows_retry() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = Arc::new(MockWineApi::new());
        api.queue_token_outcome(TokenRequestOutcome::RequestFailed {
            reason: "HTTP 500".to_string(),
        });
        api.queue_token_outcome(TokenRequestOutcome::EmailSent);
        let mut session = controller(&store, api.clone());

        session.submit_email("a@b.com").unwrap();
        session.settle().await;
        assert_eq!(
            session.acquisition(),
            Some(&AcquisitionState::AwaitingEmail {
                error: Some(Locale::En.token_request_failed().to_string())
            })
        );

        session.submit_email("a@b.com").unwrap();
        session.settle().await;
        assert_eq!(api.recorded_token_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_token_request_single_flight() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = Arc::new(DelayedMockWineApi::new(Duration::from_millis(50)));
        api.inner().queue_token_outcome(TokenRequestOutcome::EmailSent);
        let mut session = controller(&store, api.clone());

        session.submit_email("a@b.com").unwrap();
        assert!(session.submit_email("a@b.com").is_err());
        session.settle().await;

        assert_eq!(api.inner().recorded_token_requests().len(), 1);
    }

    // ========================================================================
    // Query scenarios
    // ========================================================================

    // Scenario B: the answer is the last assistant message
    #[tokio::test]
    async fn test_query_answered() {
        let store = signed_in_store();
        let api = Arc::new(MockWineApi::new());
        api.queue_answer("A Cabernet Sauvignon or a Malbec.");
        let mut session = controller(&store, api.clone());

        session.submit("What pairs with steak?");
        // User message is visible before the reply arrives
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].origin, Origin::User);
        assert!(session.is_pending());

        session.settle().await;
        assert!(!session.is_pending());
        let last = session.messages().last().unwrap();
        assert_eq!(last.origin, Origin::Assistant);
        assert_eq!(last.text, "A Cabernet Sauvignon or a Malbec.");
        assert_eq!(
            api.recorded_queries(),
            vec![("What pairs with steak?".to_string(), cred("AB12CD"))]
        );
    }

    // P1: N settled queries yield 2N alternating messages
    #[tokio::test]
    async fn test_log_alternates() {
        let store = signed_in_store();
        let api = Arc::new(MockWineApi::new());
        for i in 0..4 {
            api.queue_answer(format!("answer {i}"));
        }
        api.queue_query_outcome(QueryOutcome::TransportFailed {
            reason: "refused".to_string(),
        });
        let mut session = controller(&store, api.clone());

        for i in 0..5 {
            session.submit(&format!("question {i}"));
            session.settle().await;
        }

        let origins: Vec<_> = session.messages().iter().map(|m| m.origin).collect();
        assert_eq!(origins.len(), 10);
        for (i, origin) in origins.iter().enumerate() {
            let expected = if i % 2 == 0 { Origin::User } else { Origin::Assistant };
            assert_eq!(*origin, expected);
        }
    }

    // P2: a second submit while pending is dropped, not queued
    #[tokio::test]
    async fn test_second_submit_while_pending_is_dropped() {
        let store = signed_in_store();
        let api = Arc::new(DelayedMockWineApi::new(Duration::from_millis(50)));
        api.inner().queue_answer("first");
        api.inner().queue_answer("second");
        let mut session = controller(&store, api.clone());

        session.submit("one");
        api.call_started.notified().await;
        session.submit("two");
        assert_eq!(session.messages().len(), 1);

        session.settle().await;
        assert_eq!(session.messages().len(), 2);
        assert_eq!(api.inner().recorded_queries().len(), 1);
    }

    // P3: no credential, no message and no call
    #[tokio::test]
    async fn test_submit_without_credential_is_dropped() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = Arc::new(MockWineApi::new());
        let mut session = controller(&store, api.clone());

        session.submit("What pairs with steak?");
        assert!(session.messages().is_empty());
        assert!(!session.is_pending());
        assert!(api.recorded_queries().is_empty());
    }

    #[tokio::test]
    async fn test_blank_submit_is_dropped() {
        let store = signed_in_store();
        let api = Arc::new(MockWineApi::new());
        let mut session = controller(&store, api.clone());

        session.submit("   ");
        assert!(session.messages().is_empty());
        assert!(api.recorded_queries().is_empty());
    }

    // P5 / Scenario C: Unauthorized clears the store and restarts acquisition
    #[tokio::test]
    async fn test_unauthorized_invalidates_credential() {
        let store = signed_in_store();
        let api = Arc::new(MockWineApi::new());
        api.queue_query_outcome(QueryOutcome::Unauthorized);
        let mut session = controller(&store, api.clone());

        session.submit("What pairs with steak?");
        session.settle().await;

        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.view(), View::Acquisition);
        assert!(matches!(
            session.acquisition(),
            Some(AcquisitionState::Failed { .. })
        ));
        let last = session.messages().last().unwrap();
        assert_eq!(last.origin, Origin::Assistant);
        assert_eq!(last.text, Locale::En.token_expired());
        assert_eq!(session.drain_notices(), vec![Notice::CredentialInvalidated]);

        // Further queries are gated until a new token is confirmed
        session.submit("Anything?");
        assert_eq!(api.recorded_queries().len(), 1);
    }

    // Scenario D: transport failure keeps the credential usable
    #[tokio::test]
    async fn test_transport_failure_keeps_credential() {
        let store = signed_in_store();
        let api = Arc::new(MockWineApi::new());
        api.queue_query_outcome(QueryOutcome::TransportFailed {
            reason: "connection refused".to_string(),
        });
        api.queue_answer("Try a Riesling.");
        let mut session = controller(&store, api.clone());

        session.submit("What pairs with spicy food?");
        session.settle().await;

        assert_eq!(session.messages().last().unwrap().text, Locale::En.query_failed());
        assert_eq!(session.view(), View::Conversation);
        assert_eq!(store.load().unwrap(), Some(cred("AB12CD")));

        session.submit("Again?");
        session.settle().await;
        assert_eq!(session.messages().last().unwrap().text, "Try a Riesling.");
    }

    #[tokio::test]
    async fn test_localized_apology() {
        let store = signed_in_store();
        let api = MockWineApi::new();
        let mut session =
            SessionController::new(SessionContext::new(Locale::ZhCn), store.clone(), api);

        session.submit("配什么酒？");
        session.settle().await;
        assert_eq!(
            session.messages().last().unwrap().text,
            "很抱歉，在处理您的问题时遇到了错误。请重试。"
        );
    }

    #[tokio::test]
    async fn test_panicking_call_releases_pending() {
        let store = signed_in_store();
        let mut session = controller(&store, PanickingWineApi);

        session.submit("What pairs with steak?");
        session.settle().await;

        assert!(!session.is_pending());
        assert_eq!(session.messages().last().unwrap().text, Locale::En.query_failed());
    }

    // ========================================================================
    // Sign out and status
    // ========================================================================

    #[tokio::test]
    async fn test_sign_out() {
        let store = signed_in_store();
        let mut session = controller(&store, MockWineApi::new());

        session.sign_out().unwrap();
        assert_eq!(session.view(), View::Acquisition);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.drain_notices(), vec![Notice::SignedOut]);
    }

    #[tokio::test]
    async fn test_sign_out_rejected_while_pending() {
        let store = signed_in_store();
        let api = Arc::new(DelayedMockWineApi::new(Duration::from_millis(20)));
        api.inner().queue_answer("ok");
        let mut session = controller(&store, api);

        session.submit("question");
        assert!(session.sign_out().is_err());
        session.settle().await;
        assert!(session.sign_out().is_ok());
    }

    #[tokio::test]
    async fn test_server_mode() {
        let store = signed_in_store();
        let session = controller(&store, MockWineApi::new().with_mode(ServerMode::DryRun));
        assert_eq!(session.server_mode().await, ServerMode::DryRun);
    }
}
