use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;

use roombook::backend::{Backend, InMemoryBackend};
use roombook::driver::RequestGenerator;
use roombook::engine::{BookingEngine, BookingError, ContentionCounter, EngineOptions};
use roombook::seed;

const ROOMS: u32 = 30;
const REQUESTS: usize = 2_000;
const CONCURRENCY: usize = 64;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: n=0");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().map_or(0.0, |d| d.as_secs_f64() * 1000.0),
    );
}

async fn setup(latency: Duration) -> Arc<BookingEngine> {
    let mut rng = StdRng::seed_from_u64(1);
    let rooms = seed::generated_rooms(ROOMS, 4, &mut rng);
    let backend = Arc::new(InMemoryBackend::with_latency(latency));
    seed::seed_backend(backend.as_ref(), &rooms).await.unwrap();
    let backend: Arc<dyn Backend> = backend;
    println!("  created {} rooms", rooms.len());
    Arc::new(BookingEngine::new(
        backend,
        Arc::new(ContentionCounter::new()),
        EngineOptions::default(),
    ))
}

/// Random stays over two years: mostly uncontended.
async fn bench_random_stays(latency: Duration) {
    println!("\n== random stays (latency <= {latency:?}) ==");
    let engine = setup(latency).await;
    let requests = RequestGenerator::new(StdRng::seed_from_u64(2)).batch(REQUESTS);
    run(engine, requests.into_iter().map(|r| (r.capacity, r.occupant_name, r.stay_start, r.stay_end)).collect()).await;
}

/// Everyone wants the same week.
async fn bench_hot_week(latency: Duration) {
    println!("\n== hot week (latency <= {latency:?}) ==");
    let engine = setup(latency).await;
    let start = NaiveDate::from_ymd_opt(2020, 12, 24).unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default();
    let requests = (0..REQUESTS)
        .map(|i| ((i % 4) as u32 + 1, format!("Guest {i}"), start, end))
        .collect();
    run(engine, requests).await;
}

async fn run(engine: Arc<BookingEngine>, requests: Vec<(u32, String, NaiveDate, NaiveDate)>) {
    let semaphore = Arc::new(tokio::sync::Semaphore::new(CONCURRENCY));
    let started = Instant::now();
    let mut handles = Vec::with_capacity(requests.len());
    for (capacity, name, start, end) in requests {
        let eng = engine.clone();
        let sem = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let t = Instant::now();
            let result = eng.book_room(capacity, &name, start, end).await;
            (t.elapsed(), result)
        }));
    }

    let mut booked = Vec::new();
    let mut conflicts = Vec::new();
    let mut starved = Vec::new();
    let mut other = 0usize;
    for h in handles {
        let Ok((elapsed, result)) = h.await else {
            other += 1;
            continue;
        };
        match result {
            Ok(_) => booked.push(elapsed),
            Err(BookingError::BookingConflict { .. }) => conflicts.push(elapsed),
            Err(BookingError::NoRoomsAvailable { .. }) => starved.push(elapsed),
            Err(_) => other += 1,
        }
    }
    let wall = started.elapsed();

    println!(
        "  {} attempts in {:.2}s ({:.0}/s), contention counter = {}, other errors = {other}",
        REQUESTS,
        wall.as_secs_f64(),
        REQUESTS as f64 / wall.as_secs_f64(),
        engine.contention().get()
    );
    print_latency("booked", &mut booked);
    print_latency("conflict + rollback", &mut conflicts);
    print_latency("no rooms", &mut starved);
}

#[tokio::main]
async fn main() {
    println!("roombook stress benchmark");
    bench_random_stays(Duration::ZERO).await;
    bench_random_stays(Duration::from_micros(200)).await;
    bench_hot_week(Duration::ZERO).await;
    bench_hot_week(Duration::from_micros(200)).await;
}
