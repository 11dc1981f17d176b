use chrono::NaiveDate;

use crate::backend::BackendError;
use crate::model::ReservationKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    StorageUnavailable(String),
    EmptyCatalog,
    NoRoomsAvailable {
        requested: u32,
        free_capacity: u32,
    },
    /// A re-read after write found the key owned by someone else, or gone.
    BookingConflict {
        key: ReservationKey,
        found: Option<String>,
    },
    InvalidDateRange {
        start: NaiveDate,
        end: NaiveDate,
    },
    InvalidRequest(&'static str),
    LimitExceeded(&'static str),
    QueryFailed(String),
    WriteFailed(String),
    DeleteFailed {
        key: ReservationKey,
        reason: String,
    },
}

impl BookingError {
    pub(crate) fn from_read(e: BackendError) -> Self {
        if e.is_unavailable() {
            BookingError::StorageUnavailable(e.to_string())
        } else {
            BookingError::QueryFailed(e.to_string())
        }
    }

    pub(crate) fn from_write(e: BackendError) -> Self {
        if e.is_unavailable() {
            BookingError::StorageUnavailable(e.to_string())
        } else {
            BookingError::WriteFailed(e.to_string())
        }
    }

    pub(crate) fn from_delete(key: ReservationKey, e: BackendError) -> Self {
        BookingError::DeleteFailed {
            key,
            reason: e.to_string(),
        }
    }

    /// Short label for metrics and batch summaries.
    pub fn label(&self) -> &'static str {
        match self {
            BookingError::StorageUnavailable(_) => "storage_unavailable",
            BookingError::EmptyCatalog => "empty_catalog",
            BookingError::NoRoomsAvailable { .. } => "no_rooms_available",
            BookingError::BookingConflict { .. } => "booking_conflict",
            BookingError::InvalidDateRange { .. } => "invalid_date_range",
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::LimitExceeded(_) => "limit_exceeded",
            BookingError::QueryFailed(_) => "query_failed",
            BookingError::WriteFailed(_) => "write_failed",
            BookingError::DeleteFailed { .. } => "delete_failed",
        }
    }
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::StorageUnavailable(e) => write!(f, "storage unavailable: {e}"),
            BookingError::EmptyCatalog => write!(f, "no rooms configured"),
            BookingError::NoRoomsAvailable {
                requested,
                free_capacity,
            } => write!(
                f,
                "no rooms available: requested capacity {requested}, free capacity {free_capacity}"
            ),
            BookingError::BookingConflict { key, found } => match found {
                Some(name) => write!(f, "booking conflict at {key}: overwritten by {name:?}"),
                None => write!(f, "booking conflict at {key}: record vanished"),
            },
            BookingError::InvalidDateRange { start, end } => {
                write!(f, "invalid date range: {end} is before {start}")
            }
            BookingError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            BookingError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            BookingError::QueryFailed(e) => write!(f, "query failed: {e}"),
            BookingError::WriteFailed(e) => write!(f, "write failed: {e}"),
            BookingError::DeleteFailed { key, reason } => {
                write!(f, "delete failed at {key}: {reason}")
            }
        }
    }
}

impl std::error::Error for BookingError {}
