//! Room synchronization client: history replay, live apply, reconnection.
//!
//! DESIGN
//! ======
//! The client owns the local shape list for one room. Transport is left to
//! the host (browser socket or the cli): the host reports what happened and
//! sends whatever messages this module builds.
//!
//! ```text
//! Disconnected ──connection_opened──▶ Replaying ──joined + history──▶ Live
//!       ▲                                 ▲                            │
//!       │                                 └──connection_opened── Reconnecting
//!       │                                                              ▲
//!       └──────────────────────── connection_lost ────────────────────┘
//! ```
//!
//! Every `connection_opened` issues a new [`ReplayTicket`]; join
//! acknowledgements and history results carrying an older ticket are
//! ignored, which is how an in-flight replay is cancelled. Events that arrive
//! while replaying are buffered and applied, in arrival order, right after
//! the history.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use protocol::{ClientMessage, HistoryRecord, RoomId, ServerMessage};

use crate::shape::{Shape, ShapeError, decode_payload, encode_payload};

/// Connection phase of a [`SyncClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Never connected.
    Disconnected,
    /// Connected; waiting for the join handshake and the history fetch.
    Replaying,
    /// History applied and joined; inbound events apply immediately.
    Live,
    /// Transport lost; waiting for the host to reconnect.
    Reconnecting,
}

/// Identifies one replay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayTicket(u64);

pub struct SyncClient {
    room_id: RoomId,
    state: SyncState,
    generation: u64,
    joined: bool,
    history_applied: bool,
    shapes: Vec<Shape>,
    buffered: Vec<String>,
}

impl SyncClient {
    #[must_use]
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            state: SyncState::Disconnected,
            generation: 0,
            joined: false,
            history_applied: false,
            shapes: Vec::new(),
            buffered: Vec::new(),
        }
    }

    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Local shapes in paint order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Events waiting for the replay to finish.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    // --- Connection lifecycle ---

    /// A transport connection was established. Starts a fresh replay and
    /// cancels any replay still in flight.
    pub fn connection_opened(&mut self) -> ReplayTicket {
        self.generation += 1;
        self.state = SyncState::Replaying;
        self.joined = false;
        self.history_applied = false;
        self.buffered.clear();
        ReplayTicket(self.generation)
    }

    /// The `join_room` message to send right after the connection opens.
    #[must_use]
    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::JoinRoom { room_id: self.room_id }
    }

    #[must_use]
    pub fn leave_message(&self) -> ClientMessage {
        ClientMessage::LeaveRoom { room_id: self.room_id }
    }

    /// The join message was sent on the connection identified by `ticket`.
    /// Returns `false` for a stale ticket.
    pub fn mark_joined(&mut self, ticket: ReplayTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.joined = true;
        self.try_go_live();
        true
    }

    /// Replace the shape list with `history` (oldest first). Records whose
    /// payload does not decode are skipped. Returns `false`, changing nothing,
    /// for a stale ticket.
    pub fn complete_replay(&mut self, ticket: ReplayTicket, history: &[HistoryRecord]) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.shapes = history.iter().flat_map(|record| decode_payload(&record.message)).collect();
        self.history_applied = true;
        self.try_go_live();
        true
    }

    /// The transport closed or failed. Drops buffered events and cancels the
    /// replay in flight; the shape list stays visible until the next replay.
    pub fn connection_lost(&mut self) {
        self.generation += 1;
        self.state = SyncState::Reconnecting;
        self.joined = false;
        self.history_applied = false;
        self.buffered.clear();
    }

    // --- Events ---

    /// Handle one inbound server message. Returns `true` when the shape list
    /// changed and a redraw is needed.
    pub fn receive(&mut self, message: &ServerMessage) -> bool {
        let ServerMessage::Chat(event) = message;
        if event.room_id != self.room_id {
            return false;
        }
        match self.state {
            SyncState::Live => self.apply_payload(&event.message),
            SyncState::Replaying => {
                self.buffered.push(event.message.clone());
                false
            }
            SyncState::Disconnected | SyncState::Reconnecting => false,
        }
    }

    /// Append a locally committed shape. Its echo will append it again.
    pub fn apply_local(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Build the outbound `chat` message for a locally committed shape.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if the shape cannot be encoded.
    pub fn chat_message(&self, shape: &Shape) -> Result<ClientMessage, ShapeError> {
        Ok(ClientMessage::Chat { room_id: self.room_id, message: encode_payload(shape)? })
    }

    // --- Internals ---

    fn is_current(&self, ticket: ReplayTicket) -> bool {
        self.state == SyncState::Replaying && ticket.0 == self.generation
    }

    fn try_go_live(&mut self) {
        if !(self.joined && self.history_applied) {
            return;
        }
        self.state = SyncState::Live;
        for payload in std::mem::take(&mut self.buffered) {
            self.apply_payload(&payload);
        }
    }

    fn apply_payload(&mut self, payload: &str) -> bool {
        match decode_payload(payload) {
            Ok(shape) => {
                self.shapes.push(shape);
                true
            }
            Err(_) => false,
        }
    }
}
