//! WebSocket handler: room-scoped drawing event relay.
//!
//! DESIGN
//! ======
//! The credential is verified before the upgrade, so an unverified socket
//! never exists and never reaches the registry. After the upgrade each
//! connection runs one `select!` loop:
//! - Incoming client text (or UTF-8 binary) → parse → join / leave / publish
//! - Events fanned out by the room router → forward to the client
//!
//! `process_inbound_text` holds all message handling and returns an
//! [`Inbound`] outcome, keeping transport concerns out of it so tests can
//! drive it without a socket.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (credential verified) → register with no rooms
//! 2. Client joins rooms and publishes `chat` events
//! 3. Close or transport error → unregister from every room

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use protocol::{ClientMessage, RoomId, ServerMessage};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::services::broadcast::Published;
use crate::services::identity::{Identity, verify_with_timeout};
use crate::services::registry::ConnectionId;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

// =============================================================================
// OUTCOME
// =============================================================================

/// What one inbound message did. The connection loop only logs it; the
/// client never receives a reply besides the echo of its own events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inbound {
    Joined { room_id: RoomId, changed: bool },
    Left { room_id: RoomId, changed: bool },
    Published(Published),
    /// The event store rejected the event; nothing was broadcast.
    Dropped,
    /// The text was not a valid client message.
    Malformed,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = params.token.unwrap_or_default();

    let identity = match verify_with_timeout(state.verifier.as_ref(), &credential, state.config.verify_timeout).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return (StatusCode::UNAUTHORIZED, "invalid or missing token").into_response(),
        Err(e) => {
            error!(error = %e, "ws credential verification failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "identity verification unavailable").into_response();
        }
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, identity))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, identity: Identity) {
    let connection_id = Uuid::new_v4();
    let user_id = identity.user_id;

    // Outbound queue fed by the room router.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.config.client_queue_capacity);
    state.registry.register(connection_id, identity, client_tx).await;

    info!(%connection_id, %user_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&state, connection_id, identity, text.as_str()).await;
                    }
                    // Some clients send the same JSON in binary frames.
                    Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                        Ok(text) => {
                            process_inbound_text(&state, connection_id, identity, text).await;
                        }
                        Err(e) => warn!(%connection_id, error = %e, "ws: binary frame is not utf-8"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(outbound) = client_rx.recv() => {
                if send_message(&mut socket, &outbound).await.is_err() {
                    break;
                }
            }
        }
    }

    let rooms = state.registry.unregister(connection_id).await;
    let connections = state.registry.connection_count().await;
    let active_rooms = state.registry.room_count().await;
    info!(%connection_id, %user_id, rooms = rooms.len(), connections, active_rooms, "ws: client disconnected");
}

// =============================================================================
// INBOUND
// =============================================================================

/// Parse and handle one inbound text message.
///
/// Malformed input is logged and ignored; the connection stays open. `chat`
/// is published to the named room without checking that the sender joined it.
pub(crate) async fn process_inbound_text(
    state: &AppState,
    connection_id: ConnectionId,
    identity: Identity,
    text: &str,
) -> Inbound {
    let message = match protocol::parse_client_message(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(%connection_id, error = %e, "ws: invalid inbound message");
            return Inbound::Malformed;
        }
    };

    match message {
        ClientMessage::JoinRoom { room_id } => {
            let changed = state.registry.join_room(connection_id, room_id).await;
            let members = state.registry.members_of(room_id).await.len();
            info!(%connection_id, room_id, changed, members, "ws: join room");
            Inbound::Joined { room_id, changed }
        }
        ClientMessage::LeaveRoom { room_id } => {
            let changed = state.registry.leave_room(connection_id, room_id).await;
            let members = state.registry.members_of(room_id).await.len();
            info!(%connection_id, room_id, changed, members, "ws: leave room");
            Inbound::Left { room_id, changed }
        }
        ClientMessage::Chat { room_id, message } => {
            match state.router.publish(room_id, identity.user_id, &message).await {
                Ok(published) => Inbound::Published(published),
                Err(e) => {
                    warn!(%connection_id, room_id, error = %e, "ws: event dropped");
                    Inbound::Dropped
                }
            }
        }
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let json = match protocol::to_text(message) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
