//! Table status derivation
//!
//! A table's stored status is only a cache; the authoritative value is
//! computed here from the table's confirmed reservations for the current day.
//! Priority order, first match wins:
//!
//! 1. a confirmed reservation contains `now` → OCCUPIED
//! 2. the next confirmed reservation starts within the pre-arrival buffer
//!    → OCCUPIED; beyond the buffer → RESERVED
//! 3. otherwise → AVAILABLE
//!
//! The pre-arrival buffer keeps walk-ins off a table that a confirmed booking
//! is about to claim.

use shared::models::{Reservation, TableStatus};

/// Minutes before a confirmed booking's start during which the table already
/// counts as occupied.
pub const PRE_ARRIVAL_BUFFER_MIN: i64 = 60;

/// A derived status together with the reservation that drove it (for audit
/// logging; None means "no reservation applies").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedStatus {
    pub status: TableStatus,
    pub cause: Option<i64>,
}

/// Derive a table's status at `now_minute` (minutes since midnight) from its
/// confirmed reservations for the same day.
///
/// Pure function: same inputs always give the same output. The slice does not
/// need to be sorted; only one reservation can contain `now` given the
/// overlap invariant.
pub fn derive_status(confirmed_today: &[Reservation], now_minute: i64) -> DerivedStatus {
    // 1. Containment: start <= now < start + duration
    if let Some(current) = confirmed_today
        .iter()
        .find(|r| r.start_minute <= now_minute && now_minute < r.end_minute())
    {
        return DerivedStatus {
            status: TableStatus::Occupied,
            cause: Some(current.id),
        };
    }

    // 2. Earliest upcoming booking today
    if let Some(next) = confirmed_today
        .iter()
        .filter(|r| r.start_minute > now_minute)
        .min_by_key(|r| r.start_minute)
    {
        let gap = next.start_minute - now_minute;
        let status = if gap <= PRE_ARRIVAL_BUFFER_MIN {
            TableStatus::Occupied
        } else {
            TableStatus::Reserved
        };
        return DerivedStatus {
            status,
            cause: Some(next.id),
        };
    }

    // 3. Nothing current or upcoming
    DerivedStatus {
        status: TableStatus::Available,
        cause: None,
    }
}
