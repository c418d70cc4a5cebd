//! Event store: append-only log of drawing events per room.
//!
//! DESIGN
//! ======
//! The log is the only durable state in the system. Late joiners rebuild a
//! room's canvas by replaying it oldest first, so ids must grow with arrival
//! order within a room. Events are never updated or deleted.
//!
//! [`PgEventStore`] is the production adapter (`room_events`, bigserial id).
//! [`MemoryEventStore`] backs development runs without `DATABASE_URL` and the
//! websocket tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use protocol::{HistoryRecord, RoomId};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// One persisted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: i64,
    pub room_id: RoomId,
    pub user_id: Uuid,
    pub message: String,
}

impl From<StoredEvent> for HistoryRecord {
    fn from(event: StoredEvent) -> Self {
        Self { id: event.id, room_id: event.room_id, user_id: event.user_id, message: event.message }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("event store timed out after {0:?}")]
    Timeout(Duration),
    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails. Nothing is stored then.
    async fn append(&self, room_id: RoomId, user_id: Uuid, message: &str) -> Result<StoredEvent, StoreError>;

    /// Return the most recent `limit` events of a room, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the read fails.
    async fn read_history(&self, room_id: RoomId, limit: usize) -> Result<Vec<StoredEvent>, StoreError>;
}

/// Bound an append by `timeout`.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] when the bound elapses, or the store's own error.
pub async fn append_with_timeout(
    store: &dyn EventStore,
    room_id: RoomId,
    user_id: Uuid,
    message: &str,
    timeout: Duration,
) -> Result<StoredEvent, StoreError> {
    tokio::time::timeout(timeout, store.append(room_id, user_id, message))
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}

/// Bound a history read by `timeout`.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] when the bound elapses, or the store's own error.
pub async fn read_history_with_timeout(
    store: &dyn EventStore,
    room_id: RoomId,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<StoredEvent>, StoreError> {
    tokio::time::timeout(timeout, store.read_history(room_id, limit))
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, room_id: RoomId, user_id: Uuid, message: &str) -> Result<StoredEvent, StoreError> {
        let row = sqlx::query("INSERT INTO room_events (room_id, user_id, message) VALUES ($1, $2, $3) RETURNING id")
            .bind(room_id)
            .bind(user_id)
            .bind(message)
            .fetch_one(&self.pool)
            .await?;

        Ok(StoredEvent { id: row.get("id"), room_id, user_id, message: message.to_owned() })
    }

    async fn read_history(&self, room_id: RoomId, limit: usize) -> Result<Vec<StoredEvent>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r"SELECT id, room_id, user_id, message
              FROM room_events
              WHERE room_id = $1
              ORDER BY id DESC
              LIMIT $2",
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut events: Vec<StoredEvent> = rows
            .into_iter()
            .map(|r| StoredEvent {
                id: r.get("id"),
                room_id: r.get("room_id"),
                user_id: r.get("user_id"),
                message: r.get("message"),
            })
            .collect();
        events.reverse();
        Ok(events)
    }
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default)]
struct MemoryLog {
    next_id: i64,
    rooms: HashMap<RoomId, Vec<StoredEvent>>,
}

/// Process-local store. Ids are global across rooms, like a bigserial column.
#[derive(Default)]
pub struct MemoryEventStore {
    log: Mutex<MemoryLog>,
}

impl MemoryEventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, room_id: RoomId, user_id: Uuid, message: &str) -> Result<StoredEvent, StoreError> {
        let mut log = self.log.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        log.next_id += 1;
        let event = StoredEvent { id: log.next_id, room_id, user_id, message: message.to_owned() };
        log.rooms.entry(room_id).or_default().push(event.clone());
        Ok(event)
    }

    async fn read_history(&self, room_id: RoomId, limit: usize) -> Result<Vec<StoredEvent>, StoreError> {
        let log = self.log.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(events) = log.rooms.get(&room_id) else {
            return Ok(Vec::new());
        };
        let skip = events.len().saturating_sub(limit);
        Ok(events[skip..].to_vec())
    }
}

#[cfg(test)]
#[path = "event_store_test.rs"]
mod tests;
