use std::collections::HashSet;
use std::io;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{Backend, BackendError};
use crate::limits::MAX_SEED_ROOMS;
use crate::model::Room;

/// On-disk inventory: `{"rooms": [{"id": 1, "capacity": 2}, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFile {
    pub rooms: Vec<Room>,
}

pub fn load_seed_file(path: &Path) -> io::Result<Vec<Room>> {
    let raw = std::fs::read_to_string(path)?;
    parse_seed(&raw)
}

pub fn parse_seed(raw: &str) -> io::Result<Vec<Room>> {
    let seed: SeedFile = serde_json::from_str(raw)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    validate_rooms(&seed.rooms)?;
    Ok(seed.rooms)
}

fn validate_rooms(rooms: &[Room]) -> io::Result<()> {
    if rooms.len() > MAX_SEED_ROOMS {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "too many rooms in seed"));
    }
    let mut ids = HashSet::new();
    for room in rooms {
        if room.capacity == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("room {} has zero capacity", room.id),
            ));
        }
        if !ids.insert(room.id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("duplicate room id {}", room.id),
            ));
        }
    }
    Ok(())
}

/// `count` rooms with ids `1..=count` and capacities in `1..=max_capacity`.
pub fn generated_rooms<R: Rng + ?Sized>(count: u32, max_capacity: u32, rng: &mut R) -> Vec<Room> {
    let max_capacity = max_capacity.max(1);
    (1..=count)
        .map(|id| Room::new(id, rng.gen_range(1..=max_capacity)))
        .collect()
}

/// Write the inventory table.
pub async fn seed_backend(backend: &dyn Backend, rooms: &[Room]) -> Result<(), BackendError> {
    for room in rooms {
        backend.put_room(*room).await?;
    }
    info!(rooms = rooms.len(), "inventory seeded");
    Ok(())
}
