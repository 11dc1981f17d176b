use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Occupant name carried by a cleared placeholder record.
pub const SENTINEL_OCCUPANT: &str = "";

pub type RoomId = u32;

/// A bookable unit of inventory. Immutable once the catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
}

impl Room {
    pub fn new(id: RoomId, capacity: u32) -> Self {
        Self { id, capacity }
    }
}

/// Natural key of the reservations table: one row per room per night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationKey {
    pub room_id: RoomId,
    pub date: NaiveDate,
}

impl ReservationKey {
    pub fn new(room_id: RoomId, date: NaiveDate) -> Self {
        Self { room_id, date }
    }
}

impl fmt::Display for ReservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room {} on {}", self.room_id, self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub occupant_name: String,
}

impl ReservationRecord {
    pub fn new(key: ReservationKey, occupant_name: impl Into<String>) -> Self {
        Self {
            room_id: key.room_id,
            date: key.date,
            occupant_name: occupant_name.into(),
        }
    }

    /// Placeholder row that marks the key as free again.
    pub fn sentinel(key: ReservationKey) -> Self {
        Self::new(key, SENTINEL_OCCUPANT)
    }

    pub fn key(&self) -> ReservationKey {
        ReservationKey::new(self.room_id, self.date)
    }

    pub fn is_cleared(&self) -> bool {
        self.occupant_name == SENTINEL_OCCUPANT
    }

    /// Value equality on the occupant name, never a prefix match.
    pub fn is_held_by(&self, occupant_name: &str) -> bool {
        !self.is_cleared() && self.occupant_name == occupant_name
    }
}

/// Inclusive `[start, end]` range of nights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StayRange {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn nights(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Every date in the stay, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stay_range_is_inclusive() {
        let stay = StayRange::new(date(2020, 1, 1), date(2020, 1, 3)).unwrap();
        let dates: Vec<_> = stay.dates().collect();
        assert_eq!(dates, vec![date(2020, 1, 1), date(2020, 1, 2), date(2020, 1, 3)]);
        assert_eq!(stay.nights(), 3);
    }

    #[test]
    fn single_night_stay() {
        let stay = StayRange::new(date(2021, 2, 28), date(2021, 2, 28)).unwrap();
        assert_eq!(stay.dates().count(), 1);
    }

    #[test]
    fn stay_crosses_year_boundary() {
        let stay = StayRange::new(date(2020, 12, 30), date(2021, 1, 2)).unwrap();
        assert_eq!(stay.nights(), 4);
        assert_eq!(stay.dates().last(), Some(date(2021, 1, 2)));
    }

    #[test]
    fn reversed_range_rejected() {
        assert!(StayRange::new(date(2020, 1, 2), date(2020, 1, 1)).is_none());
    }

    #[test]
    fn sentinel_record_is_never_held() {
        let key = ReservationKey::new(1, date(2020, 1, 1));
        let sentinel = ReservationRecord::sentinel(key);
        assert!(sentinel.is_cleared());
        assert!(!sentinel.is_held_by(""));

        let rec = ReservationRecord::new(key, "Alice");
        assert!(rec.is_held_by("Alice"));
        assert!(!rec.is_held_by("Alic"));
        assert!(!rec.is_held_by("Alice Smith"));
    }
}
