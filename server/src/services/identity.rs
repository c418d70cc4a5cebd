//! Identity verification: credential string to stable user id.
//!
//! ARCHITECTURE
//! ============
//! The websocket upgrade and the history endpoint both go through the
//! [`IdentityVerifier`] trait. Production uses [`PgSessionVerifier`] against
//! the `sessions` table; development and tests use [`StaticTokenVerifier`]
//! seeded from `SESSION_TOKENS`.
//!
//! ERROR HANDLING
//! ==============
//! `Ok(None)` means the credential was checked and rejected. `Err` means the
//! verifier itself could not answer (database down, timeout), which callers
//! surface as a service-unavailable condition rather than an auth failure.

use std::collections::HashMap;
use std::time::Duration;

use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("session lookup failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("verification timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid session token entry: {0}")]
    InvalidTokenEntry(String),
}

/// Turns an opaque credential into an [`Identity`] or rejects it.
#[async_trait::async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `credential`.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the backing store cannot be queried.
    async fn verify(&self, credential: &str) -> Result<Option<Identity>, IdentityError>;
}

/// Run `verifier.verify` bounded by `timeout`. Blank credentials are rejected
/// without consulting the verifier.
///
/// # Errors
///
/// Returns [`IdentityError::Timeout`] when the bound elapses, or the
/// verifier's own error.
pub async fn verify_with_timeout(
    verifier: &dyn IdentityVerifier,
    credential: &str,
    timeout: Duration,
) -> Result<Option<Identity>, IdentityError> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Ok(None);
    }
    tokio::time::timeout(timeout, verifier.verify(credential))
        .await
        .map_err(|_| IdentityError::Timeout(timeout))?
}

// =============================================================================
// POSTGRES
// =============================================================================

/// Looks credentials up in the `sessions` table, ignoring expired rows.
pub struct PgSessionVerifier {
    pool: PgPool,
}

impl PgSessionVerifier {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for PgSessionVerifier {
    async fn verify(&self, credential: &str) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()")
            .bind(credential)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Identity { user_id: r.get("user_id") }))
    }
}

// =============================================================================
// STATIC
// =============================================================================

/// Fixed token table for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokenVerifier {
    #[must_use]
    pub fn new(tokens: HashMap<String, Uuid>) -> Self {
        Self { tokens }
    }

    /// Parse `token=uuid,token=uuid`. Whitespace around entries is ignored
    /// and empty entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidTokenEntry`] for an entry without `=`,
    /// with an empty token, or with a malformed uuid.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let mut tokens = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, user) = entry
                .split_once('=')
                .ok_or_else(|| IdentityError::InvalidTokenEntry(entry.to_owned()))?;
            let token = token.trim();
            if token.is_empty() {
                return Err(IdentityError::InvalidTokenEntry(entry.to_owned()));
            }
            let user_id =
                Uuid::parse_str(user.trim()).map_err(|_| IdentityError::InvalidTokenEntry(entry.to_owned()))?;
            tokens.insert(token.to_owned(), user_id);
        }
        Ok(Self { tokens })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<Option<Identity>, IdentityError> {
        Ok(self.tokens.get(credential).map(|user_id| Identity { user_id: *user_id }))
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
