use chrono::NaiveDate;
use futures::future::try_join_all;

use crate::model::*;

use super::{BookingEngine, BookingError};

impl BookingEngine {
    /// True when no real occupant holds `room` on `date`. A cleared sentinel
    /// row counts as free.
    pub async fn is_free(&self, room: &Room, date: NaiveDate) -> Result<bool, BookingError> {
        let key = ReservationKey::new(room.id, date);
        let found = self
            .call(self.backend.get_reservation(&key))
            .await
            .map_err(BookingError::from_read)?;
        Ok(found.is_none_or(|r| r.is_cleared()))
    }

    /// Subset of `candidates` free on `date`, in candidate order.
    ///
    /// Callers pass the first night of the stay. Later nights are not probed:
    /// a room free on arrival but taken mid-stay is only caught by the
    /// re-read after write.
    pub async fn filter_free(
        &self,
        candidates: &[Room],
        date: NaiveDate,
    ) -> Result<Vec<Room>, BookingError> {
        let probes = candidates.iter().map(|room| self.is_free(room, date));
        let free = try_join_all(probes).await?;
        Ok(candidates
            .iter()
            .zip(free)
            .filter_map(|(room, free)| free.then_some(*room))
            .collect())
    }
}
