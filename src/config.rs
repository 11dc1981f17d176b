use std::path::PathBuf;
use std::time::Duration;

use crate::engine::{EngineOptions, RollbackMode};

/// Process configuration, read from `ROOMBOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub metrics_port: Option<u16>,
    pub seed_file: Option<PathBuf>,
    /// Rooms to generate when no seed file is given.
    pub rooms: u32,
    pub max_room_capacity: u32,
    pub requests: usize,
    pub concurrency: usize,
    pub backend_timeout: Duration,
    /// Max random delay injected before each in-memory backend call.
    pub backend_latency: Duration,
    pub rollback_mode: RollbackMode,
    pub cache_catalog: bool,
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_port: None,
            seed_file: None,
            rooms: 20,
            max_room_capacity: 4,
            requests: 120,
            concurrency: 16,
            backend_timeout: Duration::from_millis(2000),
            backend_latency: Duration::ZERO,
            rollback_mode: RollbackMode::Delete,
            cache_catalog: true,
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            metrics_port: lookup("ROOMBOOK_METRICS_PORT").and_then(|s| s.parse().ok()),
            seed_file: lookup("ROOMBOOK_SEED_FILE").filter(|s| !s.is_empty()).map(PathBuf::from),
            rooms: lookup("ROOMBOOK_ROOMS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.rooms),
            max_room_capacity: lookup("ROOMBOOK_MAX_ROOM_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.max_room_capacity),
            requests: lookup("ROOMBOOK_REQUESTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.requests),
            concurrency: lookup("ROOMBOOK_CONCURRENCY")
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(d.concurrency),
            backend_timeout: parsed("ROOMBOOK_BACKEND_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.backend_timeout),
            backend_latency: parsed("ROOMBOOK_BACKEND_LATENCY_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.backend_latency),
            rollback_mode: lookup("ROOMBOOK_ROLLBACK_MODE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.rollback_mode),
            cache_catalog: lookup("ROOMBOOK_CATALOG_CACHE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.cache_catalog),
            rng_seed: parsed("ROOMBOOK_RNG_SEED"),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            backend_timeout: self.backend_timeout,
            rollback_mode: self.rollback_mode,
            cache_catalog: self.cache_catalog,
            rng_seed: self.rng_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("ROOMBOOK_METRICS_PORT", "9100"),
            ("ROOMBOOK_SEED_FILE", "/tmp/rooms.json"),
            ("ROOMBOOK_REQUESTS", "500"),
            ("ROOMBOOK_CONCURRENCY", "64"),
            ("ROOMBOOK_BACKEND_TIMEOUT_MS", "250"),
            ("ROOMBOOK_ROLLBACK_MODE", "sentinel"),
            ("ROOMBOOK_CATALOG_CACHE", "false"),
            ("ROOMBOOK_RNG_SEED", "17"),
        ]);
        assert_eq!(cfg.metrics_port, Some(9100));
        assert_eq!(cfg.seed_file, Some(PathBuf::from("/tmp/rooms.json")));
        assert_eq!(cfg.requests, 500);
        assert_eq!(cfg.concurrency, 64);
        assert_eq!(cfg.backend_timeout, Duration::from_millis(250));
        assert_eq!(cfg.rollback_mode, RollbackMode::Sentinel);
        assert!(!cfg.cache_catalog);
        assert_eq!(cfg.rng_seed, Some(17));
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let cfg = config_from(&[
            ("ROOMBOOK_ROOMS", "lots"),
            ("ROOMBOOK_CONCURRENCY", "0"),
            ("ROOMBOOK_ROLLBACK_MODE", "shred"),
        ]);
        assert_eq!(cfg.rooms, 20);
        assert_eq!(cfg.concurrency, 16);
        assert_eq!(cfg.rollback_mode, RollbackMode::Delete);
    }

    #[test]
    fn engine_options_follow_config() {
        let cfg = config_from(&[("ROOMBOOK_ROLLBACK_MODE", "SENTINEL")]);
        let opts = cfg.engine_options();
        assert_eq!(opts.rollback_mode, RollbackMode::Sentinel);
        assert_eq!(opts.backend_timeout, cfg.backend_timeout);
    }
}
