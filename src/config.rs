//! Client configuration from environment variables

use crate::api::Timeouts;
use crate::locale::Locale;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Value of `SOMMELIER_DB_PATH` that keeps the token for this run only
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    ZeroTimeout { var: &'static str },
    #[error("{0}")]
    InvalidLocale(String),
    #[error("SOMMELIER_SERVER_URL must start with http:// or https://, got {0:?}")]
    InvalidServerUrl(String),
}

/// Where the token lives between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub store: StoreLocation,
    pub locale: Locale,
    pub timeouts: Timeouts,
    pub log_json: bool,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset and blank values take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let server_url = get("SOMMELIER_SERVER_URL")
            .map_or_else(|| DEFAULT_SERVER_URL.to_string(), |u| u.trim().to_string());
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidServerUrl(server_url));
        }

        let store = match get("SOMMELIER_DB_PATH") {
            Some(path) if path.trim() == IN_MEMORY_DB => StoreLocation::InMemory,
            Some(path) => StoreLocation::File(PathBuf::from(path)),
            None => {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                StoreLocation::File(PathBuf::from(format!("{home}/.sommelier/sommelier.db")))
            }
        };

        let locale = match get("SOMMELIER_LOCALE") {
            Some(tag) => tag.parse().map_err(ConfigError::InvalidLocale)?,
            None => Locale::default(),
        };

        let defaults = Timeouts::default();
        let seconds = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            let Some(value) = get(var) else {
                return Ok(default);
            };
            let secs: u64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { var, value })?;
            if secs == 0 {
                return Err(ConfigError::ZeroTimeout { var });
            }
            Ok(Duration::from_secs(secs))
        };
        let timeouts = Timeouts {
            token_request: seconds("SOMMELIER_TOKEN_TIMEOUT_SECS", defaults.token_request)?,
            query: seconds("SOMMELIER_QUERY_TIMEOUT_SECS", defaults.query)?,
            status: seconds("SOMMELIER_STATUS_TIMEOUT_SECS", defaults.status)?,
        };

        let log_json = get("SOMMELIER_LOG_JSON")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Ok(Self {
            server_url,
            store,
            locale,
            timeouts,
            log_json,
        })
    }
}
