use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::*;

use super::{BookingEngine, BookingError};

/// How a rolled-back key is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackMode {
    /// Delete the row.
    #[default]
    Delete,
    /// Overwrite the row with a sentinel record (empty occupant).
    Sentinel,
}

impl std::str::FromStr for RollbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(RollbackMode::Delete),
            "sentinel" => Ok(RollbackMode::Sentinel),
            other => Err(format!("unknown rollback mode: {other}")),
        }
    }
}

#[derive(Debug, Default)]
pub struct RollbackReport {
    pub attempted: usize,
    pub cleared: usize,
    /// One `DeleteFailed` per key that could not be cleared.
    pub failures: Vec<BookingError>,
}

impl BookingEngine {
    /// Clear every key in `keys`, in order.
    ///
    /// A failed clear is logged and skipped; the remaining keys are still
    /// attempted. Clears are not re-read afterwards.
    pub async fn rollback(&self, keys: &[ReservationKey]) -> RollbackReport {
        let mut report = RollbackReport::default();
        for key in keys {
            report.attempted += 1;
            let result = match self.options.rollback_mode {
                RollbackMode::Delete => self.call(self.backend.delete_reservation(key)).await,
                RollbackMode::Sentinel => {
                    let sentinel = ReservationRecord::sentinel(*key);
                    self.call(self.backend.put_reservation(&sentinel)).await
                }
            };
            match result {
                Ok(()) => report.cleared += 1,
                Err(e) => {
                    let err = BookingError::from_delete(*key, e);
                    warn!(error = %err, "rollback left record behind");
                    metrics::counter!(crate::observability::ROLLBACK_DELETE_FAILURES_TOTAL)
                        .increment(1);
                    report.failures.push(err);
                }
            }
        }
        metrics::counter!(crate::observability::ROLLBACK_KEYS_TOTAL).increment(report.attempted as u64);
        report
    }
}
