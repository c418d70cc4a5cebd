mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::event_store::{EventStore, MemoryEventStore, PgEventStore};
use services::identity::{IdentityVerifier, PgSessionVerifier, StaticTokenVerifier};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env();
    let port = config.port;

    let (store, verifier): (Arc<dyn EventStore>, Arc<dyn IdentityVerifier>) = match &config.database_url {
        Some(database_url) => {
            let pool = db::init_pool(database_url, config.db_max_connections)
                .await
                .expect("database init failed");
            tracing::info!(max_connections = config.db_max_connections, "postgres event store ready");
            (Arc::new(PgEventStore::new(pool.clone())), Arc::new(PgSessionVerifier::new(pool)))
        }
        None => {
            let verifier = StaticTokenVerifier::parse(config.session_tokens.as_deref().unwrap_or_default())
                .expect("invalid SESSION_TOKENS");
            tracing::warn!(tokens = verifier.len(), "DATABASE_URL not set; using in-memory event store");
            (Arc::new(MemoryEventStore::new()), Arc::new(verifier))
        }
    };

    let state = state::AppState::new(store, verifier, config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "sketchroom listening");
    axum::serve(listener, app).await.expect("server failed");
}
