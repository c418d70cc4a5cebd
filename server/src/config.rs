//! Server configuration parsed from environment variables.
//!
//! Every knob has a typed default so the service starts with only `PORT`
//! (or nothing at all) in development. `DATABASE_URL` switches the event
//! store and identity verifier from in-process adapters to Postgres.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 50;
pub const DEFAULT_HISTORY_MAX_PAGE_SIZE: usize = 500;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen port for HTTP and websocket traffic.
    pub port: u16,
    /// Postgres URL. `None` selects the in-memory event store.
    pub database_url: Option<String>,
    /// Maximum pooled Postgres connections.
    pub db_max_connections: u32,
    /// Dev-only `token=uuid` pairs accepted when no database is configured.
    pub session_tokens: Option<String>,
    /// History records returned when the request does not pass `limit`.
    pub history_page_size: usize,
    /// Upper bound applied to a requested `limit`.
    pub history_max_page_size: usize,
    /// Bound on a single event store call.
    pub store_timeout: Duration,
    /// Bound on a single credential verification.
    pub verify_timeout: Duration,
    /// Outbound queue depth per live connection.
    pub client_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            session_tokens: None,
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
            history_max_page_size: DEFAULT_HISTORY_MAX_PAGE_SIZE,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`, `DATABASE_URL`, `DB_MAX_CONNECTIONS`, `SESSION_TOKENS`
    /// - `HISTORY_PAGE_SIZE`, `HISTORY_MAX_PAGE_SIZE`
    /// - `STORE_TIMEOUT_MS`, `VERIFY_TIMEOUT_MS`, `CLIENT_QUEUE_CAPACITY`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unparseable values fall back
    /// to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let history_page_size = env_parse(&lookup, "HISTORY_PAGE_SIZE", DEFAULT_HISTORY_PAGE_SIZE).max(1);
        let history_max_page_size =
            env_parse(&lookup, "HISTORY_MAX_PAGE_SIZE", DEFAULT_HISTORY_MAX_PAGE_SIZE).max(history_page_size);

        Self {
            port: env_parse(&lookup, "PORT", DEFAULT_PORT),
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: env_parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            session_tokens: non_empty("SESSION_TOKENS"),
            history_page_size,
            history_max_page_size,
            store_timeout: Duration::from_millis(env_parse(&lookup, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)),
            verify_timeout: Duration::from_millis(env_parse(&lookup, "VERIFY_TIMEOUT_MS", DEFAULT_VERIFY_TIMEOUT_MS)),
            client_queue_capacity: env_parse(&lookup, "CLIENT_QUEUE_CAPACITY", DEFAULT_CLIENT_QUEUE_CAPACITY).max(1),
        }
    }

    /// Resolve the history page size for a request. `None` means the default;
    /// explicit values are clamped to `1..=history_max_page_size`.
    #[must_use]
    pub fn history_limit(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.history_page_size, |n| n.clamp(1, self.history_max_page_size))
    }
}

/// Parse `key` from `lookup` as `T`, or return `default` when it is unset or
/// does not parse (out-of-range values included).
pub(crate) fn env_parse<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
