use parking_lot::Mutex;
use tracing::info;

/// Counts attempts that found no usable rooms. Diagnostics only; nothing in
/// the booking path reads it back.
///
/// Constructed once by the caller and shared by `Arc` with every engine that
/// should report into it.
#[derive(Debug, Default)]
pub struct ContentionCounter {
    count: Mutex<u64>,
}

impl ContentionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment under the lock and return the new value.
    pub fn increment(&self) -> u64 {
        let value = {
            let mut count = self.count.lock();
            *count += 1;
            *count
        };
        info!(contention = value, "no free rooms for attempt");
        metrics::gauge!(crate::observability::CONTENTION_COUNT).set(value as f64);
        value
    }

    pub fn get(&self) -> u64 {
        *self.count.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn increment_returns_new_value() {
        let counter = ContentionCounter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = Arc::new(ContentionCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.increment();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.get(), 8000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn increments_from_tasks_are_unique() {
        let counter = Arc::new(ContentionCounter::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let c = counter.clone();
            handles.push(tokio::spawn(async move { c.increment() }));
        }
        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=64).collect::<Vec<u64>>());
    }
}
