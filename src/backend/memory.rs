use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use rand::Rng;

use crate::model::*;

use super::{Backend, BackendError};

/// Operation counts since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub reads: u64,
    pub writes: u64,
    pub deletes: u64,
}

/// In-process row store with the same guarantees as the real backend:
/// per-row atomic upsert, last write wins, no conditional writes.
///
/// Optional jitter before every call widens the window between an attempt's
/// write and its re-read, and the fault switches let tests fail individual
/// calls.
pub struct InMemoryBackend {
    rooms: DashMap<RoomId, Room>,
    reservations: DashMap<ReservationKey, ReservationRecord>,
    max_latency: Duration,
    unavailable: AtomicBool,
    fail_next_reads: AtomicU32,
    fail_next_writes: AtomicU32,
    failing_deletes: DashSet<ReservationKey>,
    reads: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Each call sleeps a random duration in `[0, max_latency]` first.
    pub fn with_latency(max_latency: Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            reservations: DashMap::new(),
            max_latency,
            unavailable: AtomicBool::new(false),
            fail_next_reads: AtomicU32::new(0),
            fail_next_writes: AtomicU32::new(0),
            failing_deletes: DashSet::new(),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    // ── Fault injection ──────────────────────────────────────

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fail_next_reads(&self, n: u32) {
        self.fail_next_reads.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, n: u32) {
        self.fail_next_writes.store(n, Ordering::SeqCst);
    }

    /// Every delete of `key` fails until cleared.
    pub fn fail_deletes_for(&self, key: ReservationKey) {
        self.failing_deletes.insert(key);
    }

    pub fn clear_faults(&self) {
        self.set_unavailable(false);
        self.fail_next_reads(0);
        self.fail_next_writes(0);
        self.failing_deletes.clear();
    }

    // ── Inspection ───────────────────────────────────────────

    pub fn stats(&self) -> BackendStats {
        BackendStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    /// Synchronous peek for assertions; bypasses latency and faults.
    pub fn peek(&self, key: &ReservationKey) -> Option<ReservationRecord> {
        self.reservations.get(key).map(|e| e.value().clone())
    }

    // ── Internals ────────────────────────────────────────────

    async fn jitter(&self) {
        if self.max_latency.is_zero() {
            return;
        }
        let nanos = self.max_latency.as_nanos() as u64;
        let delay = Duration::from_nanos(rand::thread_rng().gen_range(0..=nanos));
        tokio::time::sleep(delay).await;
    }

    fn check_reachable(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("in-memory backend switched off"));
        }
        Ok(())
    }

    /// Consume one pending injected failure, if any.
    fn take_fault(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn before_read(&self) -> Result<(), BackendError> {
        self.jitter().await;
        self.check_reachable()?;
        if Self::take_fault(&self.fail_next_reads) {
            return Err(BackendError::failed("injected read failure"));
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn all_rooms(&self) -> Result<Vec<Room>, BackendError> {
        self.before_read().await?;
        let mut rooms: Vec<Room> = self.rooms.iter().map(|e| *e.value()).collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn put_room(&self, room: Room) -> Result<(), BackendError> {
        self.jitter().await;
        self.check_reachable()?;
        self.rooms.insert(room.id, room);
        Ok(())
    }

    async fn get_reservation(
        &self,
        key: &ReservationKey,
    ) -> Result<Option<ReservationRecord>, BackendError> {
        self.before_read().await?;
        Ok(self.reservations.get(key).map(|e| e.value().clone()))
    }

    async fn all_reservations(&self) -> Result<Vec<ReservationRecord>, BackendError> {
        self.before_read().await?;
        let mut records: Vec<ReservationRecord> =
            self.reservations.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.key());
        Ok(records)
    }

    async fn put_reservation(&self, record: &ReservationRecord) -> Result<(), BackendError> {
        self.jitter().await;
        self.check_reachable()?;
        if Self::take_fault(&self.fail_next_writes) {
            return Err(BackendError::failed("injected write failure"));
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.reservations.insert(record.key(), record.clone());
        Ok(())
    }

    async fn delete_reservation(&self, key: &ReservationKey) -> Result<(), BackendError> {
        self.jitter().await;
        self.check_reachable()?;
        if self.failing_deletes.contains(key) {
            return Err(BackendError::failed(format!("injected delete failure for {key}")));
        }
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.reservations.remove(key);
        Ok(())
    }
}
