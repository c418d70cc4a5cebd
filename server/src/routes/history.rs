//! History read endpoint: `GET /api/rooms/{room_id}/events`.
//!
//! Returns the most recent events of a room oldest first, which is the order
//! clients replay them in. The page size defaults to `HISTORY_PAGE_SIZE` and
//! a requested `limit` is capped at `HISTORY_MAX_PAGE_SIZE`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use protocol::{HistoryRecord, HistoryResponse, parse_room_id};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::routes::auth::AuthUser;
use crate::services::event_store::read_history_with_timeout;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

/// Error body. Keeps an empty `messages` array so clients can replay it as-is.
#[derive(Debug, Serialize)]
struct HistoryErrorBody {
    message: &'static str,
    messages: Vec<HistoryRecord>,
}

fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, Json(HistoryErrorBody { message, messages: Vec::new() })).into_response()
}

pub async fn room_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_room_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let Some(room_id) = parse_room_id(&raw_room_id) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid room id");
    };

    let limit = state.config.history_limit(params.limit);
    match read_history_with_timeout(state.store.as_ref(), room_id, limit, state.config.store_timeout).await {
        Ok(events) => {
            info!(room_id, user_id = %auth.identity.user_id, count = events.len(), "history: served");
            let messages = events.into_iter().map(HistoryRecord::from).collect();
            Json(HistoryResponse { messages }).into_response()
        }
        Err(e) => {
            error!(room_id, error = %e, "history: read failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to load room events")
        }
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
