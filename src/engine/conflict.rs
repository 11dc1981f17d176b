use tracing::{debug, warn};

use crate::model::*;

use super::{BookingAttempt, BookingEngine, BookingError};

impl BookingEngine {
    /// Write one record per (room, night) for the attempt's selected rooms,
    /// nights ascending, verifying each write by reading it straight back.
    ///
    /// On the first failure nothing further is written, every key in
    /// `written_keys` (the failing one included) is rolled back, and the
    /// failure is returned.
    pub(super) async fn commit_stay(&self, attempt: &mut BookingAttempt) -> Result<(), BookingError> {
        let stay = attempt.stay;
        let rooms = attempt.selected_rooms.clone();
        for date in stay.dates() {
            for room in &rooms {
                let key = ReservationKey::new(room.id, date);
                if let Err(e) = self.write_verified(attempt, key).await {
                    warn!(attempt = %attempt.id, %key, error = %e, "write not verified, rolling back");
                    let report = self.rollback(&attempt.written_keys).await;
                    debug!(
                        attempt = %attempt.id,
                        attempted = report.attempted,
                        cleared = report.cleared,
                        failed = report.failures.len(),
                        "rollback finished"
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Upsert the record, then re-read it. Verified only if the row exists and
    /// names exactly this attempt's occupant.
    pub(super) async fn write_verified(
        &self,
        attempt: &mut BookingAttempt,
        key: ReservationKey,
    ) -> Result<(), BookingError> {
        let record = ReservationRecord::new(key, attempt.occupant_name.clone());
        let written = self.call(self.backend.put_reservation(&record)).await;
        // Recorded even if the put errored: a timed-out write may still land.
        attempt.written_keys.push(key);
        written.map_err(BookingError::from_write)?;
        metrics::counter!(crate::observability::RECORDS_WRITTEN_TOTAL).increment(1);

        let found = self
            .call(self.backend.get_reservation(&key))
            .await
            .map_err(BookingError::from_read)?;
        match found {
            Some(r) if r.is_held_by(&attempt.occupant_name) => {
                debug!(attempt = %attempt.id, %key, "room reserved");
                Ok(())
            }
            other => Err(BookingError::BookingConflict {
                key,
                found: other.map(|r| r.occupant_name),
            }),
        }
    }
}
