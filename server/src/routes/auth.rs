//! Credential extraction for HTTP routes.
//!
//! The history endpoint takes the credential from `Authorization`, either as
//! `Bearer <token>` or as the bare token. The websocket upgrade passes it in
//! the `token` query parameter instead (see `ws.rs`).

use axum::extract::FromRef;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use tracing::error;

use crate::services::identity::{Identity, verify_with_timeout};
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated caller extracted from the `Authorization` header.
/// Use as a handler parameter to require authentication.
///
/// Rejections: missing credential → 401, rejected credential → 403,
/// verifier failure or timeout → 503.
pub struct AuthUser {
    pub identity: Identity,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(credential) = credential_from_headers(&parts.headers) else {
            return Err(StatusCode::UNAUTHORIZED);
        };

        let app_state = AppState::from_ref(state);
        match verify_with_timeout(app_state.verifier.as_ref(), &credential, app_state.config.verify_timeout).await {
            Ok(Some(identity)) => Ok(Self { identity }),
            Ok(None) => Err(StatusCode::FORBIDDEN),
            Err(e) => {
                error!(error = %e, "http credential verification failed");
                Err(StatusCode::SERVICE_UNAVAILABLE)
            }
        }
    }
}

/// Pull the credential out of `Authorization`. Accepts `Bearer <token>`
/// (scheme case-insensitive) or a bare token. Blank values count as missing.
#[must_use]
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        // A scheme with nothing after it is trimmed down to the bare word.
        None if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };
    if token.is_empty() { None } else { Some(token.to_owned()) }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
