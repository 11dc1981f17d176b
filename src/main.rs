use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use roombook::backend::{Backend, InMemoryBackend};
use roombook::config::Config;
use roombook::driver::{self, RequestGenerator};
use roombook::engine::{BookingEngine, ContentionCounter};
use roombook::seed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    roombook::observability::init(config.metrics_port);

    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let rooms = match &config.seed_file {
        Some(path) => seed::load_seed_file(path)?,
        None => seed::generated_rooms(config.rooms, config.max_room_capacity, &mut rng),
    };

    let backend = Arc::new(InMemoryBackend::with_latency(config.backend_latency));
    seed::seed_backend(backend.as_ref(), &rooms).await?;

    let contention = Arc::new(ContentionCounter::new());
    let backend: Arc<dyn Backend> = backend;
    let engine = Arc::new(BookingEngine::new(backend, contention, config.engine_options()));

    info!("roombook starting");
    info!("  rooms: {}", rooms.len());
    info!("  requests: {}", config.requests);
    info!("  concurrency: {}", config.concurrency);
    info!("  rollback: {:?}", config.rollback_mode);
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let requests = RequestGenerator::new(rng).batch(config.requests);

    // Stop dispatching on SIGTERM/ctrl-c; in-flight attempts still finish their rollback
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("failed to register SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };

    let summary = driver::run_batch_until(engine, requests, config.concurrency, shutdown).await;

    info!(
        booked = summary.booked,
        submitted = summary.submitted,
        skipped = summary.skipped,
        contention = summary.contention,
        "roombook finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
