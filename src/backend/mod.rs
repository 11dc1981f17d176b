mod memory;

pub use memory::{BackendStats, InMemoryBackend};

use async_trait::async_trait;

use crate::model::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Backend could not be reached (connection refused, node down).
    Unavailable,
    /// The call did not complete in time.
    Timeout,
    /// Backend was reached but rejected or failed the operation.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self { kind: BackendErrorKind::Unavailable, message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self { kind: BackendErrorKind::Timeout, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { kind: BackendErrorKind::Failed, message: message.into() }
    }

    /// Unreachable or timed out, as opposed to a rejected operation.
    pub fn is_unavailable(&self) -> bool {
        matches!(self.kind, BackendErrorKind::Unavailable | BackendErrorKind::Timeout)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            BackendErrorKind::Unavailable => write!(f, "backend unavailable: {}", self.message),
            BackendErrorKind::Timeout => write!(f, "backend timeout: {}", self.message),
            BackendErrorKind::Failed => write!(f, "backend failure: {}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// Row store consumed by the booking protocol.
///
/// Two tables: the inventory table keyed by room id, and the reservations
/// table keyed by `(room_id, date)`. Every call is atomic for a single row
/// only. `put_*` is an upsert: a second write to the same key silently
/// replaces the first, and nothing reports that it happened. There is no
/// conditional write and no cross-row transaction.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `getAll` over the inventory table.
    async fn all_rooms(&self) -> Result<Vec<Room>, BackendError>;

    /// `put` into the inventory table. Used by seeding only.
    async fn put_room(&self, room: Room) -> Result<(), BackendError>;

    /// `get` from the reservations table.
    async fn get_reservation(
        &self,
        key: &ReservationKey,
    ) -> Result<Option<ReservationRecord>, BackendError>;

    /// `getAll` over the reservations table.
    async fn all_reservations(&self) -> Result<Vec<ReservationRecord>, BackendError>;

    /// `put` into the reservations table, last write wins.
    async fn put_reservation(&self, record: &ReservationRecord) -> Result<(), BackendError>;

    /// `delete` from the reservations table. Deleting an absent key is not an error.
    async fn delete_reservation(&self, key: &ReservationKey) -> Result<(), BackendError>;
}
