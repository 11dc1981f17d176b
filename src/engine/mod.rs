mod availability;
mod catalog;
mod conflict;
mod contention;
mod error;
mod rollback;
mod selector;

pub use catalog::Catalog;
pub use contention::ContentionCounter;
pub use error::BookingError;
pub use rollback::{RollbackMode, RollbackReport};
pub use selector::select_candidates;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use ulid::Ulid;

use crate::backend::{Backend, BackendError};
use crate::limits::*;
use crate::model::*;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Upper bound on any single backend call. Expiry counts as the backend being unreachable.
    pub backend_timeout: Duration,
    pub rollback_mode: RollbackMode,
    /// Load the inventory once and reuse it, instead of once per attempt.
    pub cache_catalog: bool,
    /// Fixed seed for room shuffling. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(2),
            rollback_mode: RollbackMode::Delete,
            cache_catalog: true,
            rng_seed: None,
        }
    }
}

/// State of one run of the booking protocol. Owned by the task running it.
#[derive(Debug, Clone)]
pub struct BookingAttempt {
    pub id: Ulid,
    pub requested_capacity: u32,
    pub occupant_name: String,
    pub stay: StayRange,
    pub selected_rooms: Vec<Room>,
    /// Every key a put was issued for, in write order. Rollback undoes exactly these.
    pub written_keys: Vec<ReservationKey>,
}

/// What a successful attempt committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub attempt_id: Ulid,
    pub occupant_name: String,
    pub stay: StayRange,
    pub rooms: Vec<Room>,
    pub keys: Vec<ReservationKey>,
}

/// Client side of the booking protocol.
///
/// The backend only offers per-row upsert. An attempt picks rooms, probes
/// them at the first night, writes one record per (room, night), re-reads
/// each record right after writing it, and undoes everything it wrote as soon
/// as one re-read shows another occupant.
pub struct BookingEngine {
    backend: Arc<dyn Backend>,
    contention: Arc<ContentionCounter>,
    options: EngineOptions,
    catalog_cache: OnceCell<Catalog>,
    rng: Mutex<StdRng>,
}

impl BookingEngine {
    pub fn new(
        backend: Arc<dyn Backend>,
        contention: Arc<ContentionCounter>,
        options: EngineOptions,
    ) -> Self {
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            backend,
            contention,
            options,
            catalog_cache: OnceCell::new(),
            rng: Mutex::new(rng),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn contention(&self) -> &Arc<ContentionCounter> {
        &self.contention
    }

    /// Book rooms covering `requested_capacity` for every night in
    /// `[stay_start, stay_end]`.
    ///
    /// Never retried internally. A caller that wants retry-until-success
    /// calls again.
    pub async fn book_room(
        &self,
        requested_capacity: u32,
        occupant_name: &str,
        stay_start: NaiveDate,
        stay_end: NaiveDate,
    ) -> Result<BookingReceipt, BookingError> {
        let started = Instant::now();
        let result = self
            .run_attempt(requested_capacity, occupant_name, stay_start, stay_end)
            .await;
        metrics::counter!(
            crate::observability::ATTEMPTS_TOTAL,
            "outcome" => crate::observability::outcome_label(&result)
        )
        .increment(1);
        metrics::histogram!(crate::observability::ATTEMPT_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn run_attempt(
        &self,
        requested_capacity: u32,
        occupant_name: &str,
        stay_start: NaiveDate,
        stay_end: NaiveDate,
    ) -> Result<BookingReceipt, BookingError> {
        let stay = validate_request(requested_capacity, occupant_name, stay_start, stay_end)?;
        let catalog = self.catalog().await?;

        let candidates = select_candidates(catalog.rooms(), requested_capacity, &mut *self.rng.lock());
        let mut attempt = BookingAttempt {
            id: Ulid::new(),
            requested_capacity,
            occupant_name: occupant_name.to_string(),
            stay,
            selected_rooms: candidates,
            written_keys: Vec::new(),
        };
        debug!(
            attempt = %attempt.id,
            candidates = ?attempt.selected_rooms.iter().map(|r| r.id).collect::<Vec<_>>(),
            "selected candidate rooms"
        );

        // Probed once, at the first night only.
        let free = self.filter_free(&attempt.selected_rooms, stay.start).await?;
        let free_capacity: u64 = free.iter().map(|r| u64::from(r.capacity)).sum();
        if free.is_empty() || free_capacity < u64::from(requested_capacity) {
            self.contention.increment();
            return Err(BookingError::NoRoomsAvailable {
                requested: requested_capacity,
                free_capacity: u32::try_from(free_capacity).unwrap_or(u32::MAX),
            });
        }
        attempt.selected_rooms = free;

        self.commit_stay(&mut attempt).await?;

        info!(
            attempt = %attempt.id,
            occupant = %attempt.occupant_name,
            start = %stay.start,
            end = %stay.end,
            rooms = attempt.selected_rooms.len(),
            "booking committed"
        );
        Ok(BookingReceipt {
            attempt_id: attempt.id,
            occupant_name: attempt.occupant_name,
            stay,
            rooms: attempt.selected_rooms,
            keys: attempt.written_keys,
        })
    }

    /// Every committed record currently owned by `occupant_name`.
    pub async fn reservations_for(
        &self,
        occupant_name: &str,
    ) -> Result<Vec<ReservationRecord>, BookingError> {
        let records = self
            .call(self.backend.all_reservations())
            .await
            .map_err(BookingError::from_read)?;
        Ok(records
            .into_iter()
            .filter(|r| r.is_held_by(occupant_name))
            .collect())
    }

    /// Run one backend call under the configured timeout.
    pub(super) async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let limit = self.options.backend_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::timeout(format!("no response within {limit:?}"))),
        }
    }
}

/// Reject malformed input before any backend call.
pub(crate) fn validate_request(
    requested_capacity: u32,
    occupant_name: &str,
    stay_start: NaiveDate,
    stay_end: NaiveDate,
) -> Result<StayRange, BookingError> {
    let stay = StayRange::new(stay_start, stay_end).ok_or(BookingError::InvalidDateRange {
        start: stay_start,
        end: stay_end,
    })?;
    if requested_capacity == 0 {
        return Err(BookingError::InvalidRequest("requested capacity must be positive"));
    }
    if requested_capacity > MAX_REQUESTED_CAPACITY {
        return Err(BookingError::LimitExceeded("requested capacity too large"));
    }
    if occupant_name.is_empty() {
        return Err(BookingError::InvalidRequest("occupant name must not be empty"));
    }
    if occupant_name.len() > MAX_OCCUPANT_NAME_LEN {
        return Err(BookingError::LimitExceeded("occupant name too long"));
    }
    if stay.nights() > MAX_STAY_DAYS {
        return Err(BookingError::LimitExceeded("stay too long"));
    }
    Ok(stay)
}
