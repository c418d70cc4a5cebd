//! Connection registry: live connections and their room memberships.
//!
//! DESIGN
//! ======
//! One `RwLock` guards both the connection map and a per-room index
//! (`room_id -> connection ids`), so the two never disagree. Fan-out reads
//! the index under the read lock and clones senders out; nothing awaits
//! while the lock is held.
//!
//! Only verified connections are registered. Join and leave for an unknown
//! connection are no-ops, joins are idempotent, and unregister removes the
//! connection from every room it joined.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use protocol::{RoomId, ServerMessage};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::services::identity::Identity;

pub type ConnectionId = Uuid;

struct ConnectionEntry {
    identity: Identity,
    rooms: HashSet<RoomId>,
    tx: mpsc::Sender<ServerMessage>,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

/// Shared handle; clones refer to the same registry.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a verified connection with no rooms joined. Re-registering an id
    /// replaces its sender and identity but keeps its rooms.
    pub async fn register(&self, connection_id: ConnectionId, identity: Identity, tx: mpsc::Sender<ServerMessage>) {
        let mut inner = self.inner.write().await;
        inner
            .connections
            .entry(connection_id)
            .and_modify(|entry| {
                entry.identity = identity;
                entry.tx = tx.clone();
            })
            .or_insert_with(|| ConnectionEntry { identity, rooms: HashSet::new(), tx });
    }

    /// Add a room to the connection's membership. Returns `true` if the
    /// membership changed.
    pub async fn join_room(&self, connection_id: ConnectionId, room_id: RoomId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.connections.get_mut(&connection_id) else {
            return false;
        };
        if !entry.rooms.insert(room_id) {
            return false;
        }
        inner.rooms.entry(room_id).or_default().insert(connection_id);
        true
    }

    /// Remove a room from the connection's membership. Returns `true` if the
    /// membership changed.
    pub async fn leave_room(&self, connection_id: ConnectionId, room_id: RoomId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.connections.get_mut(&connection_id) else {
            return false;
        };
        if !entry.rooms.remove(&room_id) {
            return false;
        }
        remove_from_room(&mut inner.rooms, room_id, connection_id);
        true
    }

    /// Drop the connection and all of its memberships. Returns the rooms it
    /// had joined.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Vec<RoomId> {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.connections.remove(&connection_id) else {
            return Vec::new();
        };
        for room_id in &entry.rooms {
            remove_from_room(&mut inner.rooms, *room_id, connection_id);
        }
        entry.rooms.into_iter().collect()
    }

    pub async fn members_of(&self, room_id: RoomId) -> HashSet<ConnectionId> {
        let inner = self.inner.read().await;
        inner.rooms.get(&room_id).cloned().unwrap_or_default()
    }

    /// Outbound senders of every member of `room_id`.
    pub async fn senders_of(&self, room_id: RoomId) -> Vec<(ConnectionId, mpsc::Sender<ServerMessage>)> {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&room_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|id| inner.connections.get(id).map(|entry| (*id, entry.tx.clone())))
            .collect()
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        self.inner.read().await.rooms.len()
    }
}

#[cfg(test)]
impl ConnectionRegistry {
    /// Rooms the connection has joined, sorted. Empty for unknown connections.
    pub async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomId> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<RoomId> = inner
            .connections
            .get(&connection_id)
            .map(|entry| entry.rooms.iter().copied().collect())
            .unwrap_or_default();
        rooms.sort_unstable();
        rooms
    }

    pub async fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        let inner = self.inner.read().await;
        inner.connections.get(&connection_id).map(|entry| entry.identity)
    }
}

fn remove_from_room(rooms: &mut HashMap<RoomId, HashSet<ConnectionId>>, room_id: RoomId, connection_id: ConnectionId) {
    if let Some(members) = rooms.get_mut(&room_id) {
        members.remove(&connection_id);
        if members.is_empty() {
            rooms.remove(&room_id);
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
