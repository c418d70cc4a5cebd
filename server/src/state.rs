//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the connection registry, the room router, and the two external
//! contracts (event store and identity verifier) behind trait objects so the
//! same handlers run against Postgres in production and in-memory adapters in
//! development and tests.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::broadcast::RoomRouter;
use crate::services::event_store::EventStore;
use crate::services::identity::IdentityVerifier;
use crate::services::registry::ConnectionRegistry;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub router: RoomRouter,
    pub store: Arc<dyn EventStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, verifier: Arc<dyn IdentityVerifier>, config: ServerConfig) -> Self {
        let registry = ConnectionRegistry::new();
        let router = RoomRouter::new(registry.clone(), store.clone(), config.store_timeout);
        Self { registry, router, store, verifier, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::HashMap;

    use uuid::Uuid;

    use super::*;
    use crate::services::event_store::MemoryEventStore;
    use crate::services::identity::StaticTokenVerifier;

    /// Token accepted by [`test_app_state`] states, with its user id.
    #[must_use]
    pub fn token_for(user: u8) -> (String, Uuid) {
        let token = format!("token-{user}");
        let user_id = Uuid::from_u128(u128::from(user) + 1);
        (token, user_id)
    }

    /// Create a test `AppState` over a fresh memory store. Tokens `token-0`
    /// through `token-3` are valid.
    #[must_use]
    pub fn test_app_state() -> AppState {
        test_app_state_with_store(Arc::new(MemoryEventStore::new()))
    }

    /// Create a test `AppState` over the given store.
    #[must_use]
    pub fn test_app_state_with_store(store: Arc<dyn EventStore>) -> AppState {
        let tokens: HashMap<String, Uuid> = (0..4).map(token_for).collect();
        AppState::new(store, Arc::new(StaticTokenVerifier::new(tokens)), ServerConfig::default())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
