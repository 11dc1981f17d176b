use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::BookingEngine;
use crate::observability::outcome_label;

pub const BASE_YEAR: i32 = 2020;
pub const MAX_YEARS: i32 = 2;
pub const MAX_RESERVATION_DAYS: u64 = 30;
pub const MAX_ROOM_SIZE: u32 = 4;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Celia", "Dmitri", "Elena", "Farid", "Greta", "Hugo", "Ines", "Jonas",
    "Kasia", "Luca", "Mira", "Nils", "Olga", "Pavel", "Quinn", "Rosa", "Soren", "Tamara",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Bianchi", "Carvalho", "Dubois", "Eriksen", "Fischer", "Gomez", "Haas", "Ivanova",
    "Jansen", "Kowalski", "Lindqvist", "Moreau", "Novak", "Ortega", "Petrov", "Rossi", "Schulz",
];

/// One call's worth of `book_room` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    pub capacity: u32,
    pub occupant_name: String,
    pub stay_start: NaiveDate,
    pub stay_end: NaiveDate,
}

/// Random requests: a stay of up to `MAX_RESERVATION_DAYS + 1` nights
/// starting somewhere in `BASE_YEAR..BASE_YEAR + MAX_YEARS`, for 1 to
/// `MAX_ROOM_SIZE` guests.
pub struct RequestGenerator<R> {
    rng: R,
}

impl<R: Rng> RequestGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_request(&mut self) -> BookingRequest {
        let year = self.rng.gen_range(BASE_YEAR..BASE_YEAR + MAX_YEARS);
        let days_in_year = if NaiveDate::from_yo_opt(year, 366).is_some() { 366 } else { 365 };
        let ordinal = self.rng.gen_range(1..=days_in_year);
        let stay_start = NaiveDate::from_yo_opt(year, ordinal).unwrap_or_default();
        let extra = self.rng.gen_range(0..=MAX_RESERVATION_DAYS);
        let stay_end = stay_start.checked_add_days(Days::new(extra)).unwrap_or(stay_start);

        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Guest");
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("Unknown");
        // Suffix keeps names distinct across a batch; verification compares names.
        let tag: u32 = self.rng.gen_range(0..1_000_000);

        BookingRequest {
            capacity: self.rng.gen_range(1..=MAX_ROOM_SIZE),
            occupant_name: format!("{first} {last} #{tag:06}"),
            stay_start,
            stay_end,
        }
    }

    pub fn batch(&mut self, n: usize) -> Vec<BookingRequest> {
        (0..n).map(|_| self.next_request()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub submitted: usize,
    /// Requests never dispatched because shutdown arrived first.
    pub skipped: usize,
    pub booked: usize,
    pub outcomes: BTreeMap<&'static str, usize>,
    pub contention: u64,
}

impl BatchSummary {
    pub fn count(&self, outcome: &str) -> usize {
        self.outcomes.get(outcome).copied().unwrap_or(0)
    }
}

/// Run every request once, at most `concurrency` at a time.
pub async fn run_batch(
    engine: Arc<BookingEngine>,
    requests: Vec<BookingRequest>,
    concurrency: usize,
) -> BatchSummary {
    run_batch_until(engine, requests, concurrency, std::future::pending()).await
}

/// Like [`run_batch`], but stops dispatching once `shutdown` resolves.
/// In-flight attempts are always driven to completion so none is left half
/// written without its rollback.
pub async fn run_batch_until(
    engine: Arc<BookingEngine>,
    requests: Vec<BookingRequest>,
    concurrency: usize,
    shutdown: impl Future<Output = ()>,
) -> BatchSummary {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut summary = BatchSummary::default();
    tokio::pin!(shutdown);

    let mut pending = requests.into_iter();
    for request in pending.by_ref() {
        let permit = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown signal received, no further requests dispatched");
                summary.skipped += 1;
                break;
            }
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        summary.submitted += 1;
        let eng = engine.clone();
        tasks.spawn(async move {
            let _permit = permit; // held until the attempt finishes
            let result = eng
                .book_room(request.capacity, &request.occupant_name, request.stay_start, request.stay_end)
                .await;
            if let Err(e) = &result {
                debug!(occupant = %request.occupant_name, error = %e, "attempt failed");
            }
            outcome_label(&result)
        });
    }
    summary.skipped += pending.count();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                if outcome == "booked" {
                    summary.booked += 1;
                }
                *summary.outcomes.entry(outcome).or_default() += 1;
            }
            Err(e) => warn!("booking task panicked: {e}"),
        }
    }
    summary.contention = engine.contention().get();
    summary
}
