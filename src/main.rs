//! Sommelier - terminal client for the Wine-AI question-answering service
//!
//! A Rust client implementing a session state machine that acquires a
//! self-service access token and exchanges questions and answers with
//! the remote service.

mod api;
mod config;
mod conversation;
mod credential;
mod locale;
mod runtime;
mod state_machine;
mod terminal;
mod token_store;

use api::{HttpWineApi, LoggingApi};
use config::{ClientConfig, StoreLocation};
use runtime::SessionController;
use state_machine::SessionContext;
use std::sync::Arc;
use token_store::{MemoryTokenStore, SqliteTokenStore, TokenStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;

    // Initialize logging; stderr keeps it out of the conversation
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sommelier=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Token store
    let store: Arc<dyn TokenStore> = match &config.store {
        StoreLocation::File(path) => {
            tracing::info!(path = %path.display(), "Opening token store");
            Arc::new(SqliteTokenStore::open(path)?)
        }
        StoreLocation::InMemory => {
            tracing::info!("Using in-memory token store");
            Arc::new(MemoryTokenStore::new())
        }
    };

    // Remote service
    let api = LoggingApi::new(HttpWineApi::new(&config.server_url, config.timeouts)?);
    tracing::info!(
        server = %config.server_url,
        query_timeout_secs = config.timeouts.query.as_secs(),
        "Wine-AI client configured"
    );

    let mut session = SessionController::new(SessionContext::new(config.locale), store, api);
    terminal::run(&mut session, &config.server_url).await?;

    Ok(())
}
