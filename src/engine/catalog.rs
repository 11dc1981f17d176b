use std::sync::Arc;

use tracing::debug;

use crate::model::Room;

use super::{BookingEngine, BookingError};

/// Inventory snapshot for a run. Cheap to clone, never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    rooms: Arc<[Room]>,
}

impl Catalog {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self { rooms: rooms.into() }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn total_capacity(&self) -> u64 {
        self.rooms.iter().map(|r| u64::from(r.capacity)).sum()
    }
}

impl BookingEngine {
    /// Read the inventory table from the backend.
    pub async fn load_catalog(&self) -> Result<Catalog, BookingError> {
        let rooms = self
            .call(self.backend.all_rooms())
            .await
            .map_err(BookingError::from_read)?;
        if rooms.is_empty() {
            return Err(BookingError::EmptyCatalog);
        }
        debug!(rooms = rooms.len(), "catalog loaded");
        Ok(Catalog::new(rooms))
    }

    /// Catalog for the current attempt, cached after the first successful
    /// load when `cache_catalog` is set. A failed load is not cached.
    pub(super) async fn catalog(&self) -> Result<Catalog, BookingError> {
        if !self.options.cache_catalog {
            return self.load_catalog().await;
        }
        self.catalog_cache
            .get_or_try_init(|| self.load_catalog())
            .await
            .cloned()
    }
}
