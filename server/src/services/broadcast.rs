//! Room broadcast router: persist first, then fan out.
//!
//! DESIGN
//! ======
//! `publish` holds a per-room async mutex across the store append and the
//! fan-out. Two publishes to one room therefore reach every member in call
//! order, while different rooms never contend. A store failure or timeout
//! drops the event: nothing is broadcast and nothing is retried.
//!
//! Fan-out uses `try_send` into each member's bounded outbound queue. A full
//! or closed queue costs that member this one event and never stalls the
//! room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use protocol::{ChatEvent, RoomId, ServerMessage};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::event_store::{EventStore, StoreError, append_with_timeout};
use crate::services::registry::ConnectionRegistry;

/// Outcome of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    /// Id assigned by the event store.
    pub event_id: i64,
    /// Members whose queue accepted the event.
    pub delivered: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event not persisted: {0}")]
    Store(#[from] StoreError),
}

type RoomLocks = Arc<Mutex<HashMap<RoomId, Arc<tokio::sync::Mutex<()>>>>>;

#[derive(Clone)]
pub struct RoomRouter {
    registry: ConnectionRegistry,
    store: Arc<dyn EventStore>,
    store_timeout: Duration,
    room_locks: RoomLocks,
}

impl RoomRouter {
    #[must_use]
    pub fn new(registry: ConnectionRegistry, store: Arc<dyn EventStore>, store_timeout: Duration) -> Self {
        Self { registry, store, store_timeout, room_locks: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Persist one drawing event for `room_id` and deliver it, unmodified, to
    /// every current member of the room including the author's connections.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Store`] if the append fails or times out. The
    /// event is not broadcast in that case.
    pub async fn publish(&self, room_id: RoomId, user_id: Uuid, message: &str) -> Result<Published, PublishError> {
        let lock = self.room_lock(room_id);
        let result = {
            let _guard = lock.lock().await;
            self.persist_and_fan_out(room_id, user_id, message).await
        };
        drop(lock);
        self.prune_room_lock(room_id);
        result
    }

    async fn persist_and_fan_out(
        &self,
        room_id: RoomId,
        user_id: Uuid,
        message: &str,
    ) -> Result<Published, PublishError> {
        let stored = match append_with_timeout(self.store.as_ref(), room_id, user_id, message, self.store_timeout).await
        {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, room_id, %user_id, "event append failed; dropping event");
                return Err(e.into());
            }
        };

        let outbound = ServerMessage::Chat(ChatEvent { room_id, user_id, message: stored.message });
        let mut delivered = 0;
        for (connection_id, tx) in self.registry.senders_of(room_id).await {
            match tx.try_send(outbound.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(%connection_id, room_id, event_id = stored.id, "outbound queue full; event dropped for member");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(%connection_id, room_id, event_id = stored.id, "outbound queue closed; event dropped for member");
                }
            }
        }

        info!(room_id, %user_id, event_id = stored.id, delivered, "event published");
        Ok(Published { event_id: stored.id, delivered })
    }

    fn room_lock(&self, room_id: RoomId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.room_locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.entry(room_id).or_default().clone()
    }

    /// Drop the room's lock once no publish holds or waits on it.
    fn prune_room_lock(&self, room_id: RoomId) {
        let mut locks = self.room_locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if locks.get(&room_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&room_id);
        }
    }

    #[cfg(test)]
    fn tracked_room_locks(&self) -> usize {
        self.room_locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
