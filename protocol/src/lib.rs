//! Shared wire model for the realtime room transport and the history endpoint.
//!
//! This crate owns the JSON text representation used by `server`, `canvas`
//! and `cli`. The drawing payload inside a `chat` message is an opaque
//! string at this layer; only clients decode it into shapes.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier of a broadcast room. Always positive once parsed.
pub type RoomId = i64;

/// Error returned by the parse helpers.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The text was not valid JSON or did not match any known message shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// A message sent by a client over the live connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving events for a room.
    JoinRoom {
        #[serde(rename = "roomId", deserialize_with = "deserialize_room_id")]
        room_id: RoomId,
    },
    /// Stop receiving events for a room.
    LeaveRoom {
        #[serde(rename = "roomId", deserialize_with = "deserialize_room_id")]
        room_id: RoomId,
    },
    /// Publish a drawing event. `message` is the string-encoded `{shape}` envelope.
    Chat {
        #[serde(rename = "roomId", deserialize_with = "deserialize_room_id")]
        room_id: RoomId,
        message: String,
    },
}

impl ClientMessage {
    /// The room this message targets.
    #[must_use]
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::JoinRoom { room_id } | Self::LeaveRoom { room_id } | Self::Chat { room_id, .. } => *room_id,
        }
    }
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// A drawing event as stored and fanned out. Identical for every recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "roomId", deserialize_with = "deserialize_room_id")]
    pub room_id: RoomId,
    /// Author of the event.
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// String-encoded `{shape}` envelope, relayed verbatim.
    pub message: String,
}

/// A message delivered by the server over the live connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Chat(ChatEvent),
}

// =============================================================================
// HISTORY
// =============================================================================

/// One stored event as returned by the history endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Store-assigned sequence number; increases with arrival order per room.
    pub id: i64,
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub message: String,
}

/// Body of `GET /api/rooms/{room_id}/events`. Records are oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryRecord>,
}

// =============================================================================
// HELPERS
// =============================================================================

/// Parse one inbound text message from a client.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] for malformed JSON, unknown `type` tags, or
/// a room id that is not an integer.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse one message received from the server.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] when the text is not a known server message.
pub fn parse_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize any wire message to JSON text.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if serialization fails.
pub fn to_text<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Parse a room id from text, as found in route segments and query strings.
/// Zero, negative and non-numeric values yield `None`.
#[must_use]
pub fn parse_room_id(raw: &str) -> Option<RoomId> {
    match raw.trim().parse::<RoomId>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

/// Accept a room id as a positive JSON integer, integral float, or decimal
/// string.
///
/// Browser clients hold room ids as route strings and do not always convert
/// before sending.
fn deserialize_room_id<'de, D>(deserializer: D) -> Result<RoomId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let id = match Raw::deserialize(deserializer)? {
        Raw::Int(v) => v,
        #[allow(clippy::cast_possible_truncation)]
        Raw::Float(v) if v.fract() == 0.0 && v.is_finite() => v as i64,
        Raw::Float(v) => return Err(serde::de::Error::custom(format!("room id must be an integer, got {v}"))),
        Raw::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("room id must be an integer, got {s:?}")))?,
    };
    if id <= 0 {
        return Err(serde::de::Error::custom(format!("room id must be positive, got {id}")));
    }
    Ok(id)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
