//! Host-side plumbing shared by every embedding of the engine.
//!
//! An embedding (the browser export in `web.rs`) owns the socket and the DOM.
//! After each engine call it turns the returned [`Action`]s into a [`Plan`]:
//! the `chat` texts to put on the socket, a cursor change, and whether to
//! redraw. Inbound socket text goes through [`receive_text`]. Both are plain
//! functions over [`EngineCore`] so they run in native tests.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use protocol::{ProtocolError, RoomId};

use crate::engine::{Action, EngineCore};
use crate::shape::{Shape, ShapeError};

/// Errors surfaced to the embedding. None of them are fatal to the engine.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("history request failed with HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

/// What the embedding has to do after the engine handled an event.
#[derive(Debug, Default)]
pub struct Plan {
    /// Serialized `chat` messages, in commit order.
    pub outbound: Vec<String>,
    /// Last cursor requested by the engine.
    pub cursor: Option<String>,
    pub render: bool,
    /// Shapes that were committed locally but cannot be sent.
    pub unsent: Vec<(Shape, HostError)>,
}

/// Fold engine actions into a [`Plan`].
#[must_use]
pub fn plan(core: &EngineCore, actions: Vec<Action>) -> Plan {
    let mut plan = Plan::default();
    for action in actions {
        match action {
            Action::RenderNeeded => plan.render = true,
            Action::SetCursor(cursor) => plan.cursor = Some(cursor),
            Action::ShapeCommitted(shape) => match chat_text(core, &shape) {
                Ok(text) => plan.outbound.push(text),
                Err(e) => plan.unsent.push((shape, e)),
            },
        }
    }
    plan
}

/// The wire text of the `chat` message for `shape`.
///
/// # Errors
///
/// Returns [`HostError::Shape`] when the shape cannot be encoded.
pub fn chat_text(core: &EngineCore, shape: &Shape) -> Result<String, HostError> {
    Ok(protocol::to_text(&core.chat_message(shape)?)?)
}

/// The wire text of the `join_room` message for the engine's room.
///
/// # Errors
///
/// Returns [`HostError::Protocol`] if serialization fails.
pub fn join_text(core: &EngineCore) -> Result<String, HostError> {
    Ok(protocol::to_text(&core.join_message())?)
}

/// Parse one server message and hand it to the engine.
///
/// # Errors
///
/// Returns [`HostError::Protocol`] for text that is not a server message.
pub fn receive_text(core: &mut EngineCore, text: &str) -> Result<Vec<Action>, HostError> {
    let message = protocol::parse_server_message(text)?;
    Ok(core.receive(&message))
}

/// Websocket URL on the page's own origin. `page_protocol` is
/// `location.protocol` (`"https:"` selects `wss`); `token` must already be
/// URI-encoded.
#[must_use]
pub fn ws_url(page_protocol: &str, page_host: &str, token: &str) -> String {
    let scheme = if page_protocol == "https:" { "wss" } else { "ws" };
    format!("{scheme}://{page_host}/api/ws?token={token}")
}

/// Origin-relative path of the room's history endpoint.
#[must_use]
pub fn history_path(room_id: RoomId) -> String {
    format!("/api/rooms/{room_id}/events")
}
