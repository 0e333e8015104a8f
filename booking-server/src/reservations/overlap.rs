//! Time-range overlap checks
//!
//! Reservation intervals are half-open `[start, start + duration)` in minutes
//! since midnight. Two intervals conflict iff they share at least one minute;
//! intervals that only touch (`a_end == b_start`) do not conflict, so a
//! booking may begin exactly when the previous one ends.

use crate::utils::time::MINUTES_PER_DAY;
use shared::models::Reservation;

use super::{SchedulingError, SchedulingResult};

/// Symmetric half-open interval overlap test.
///
/// `a < b_end && b < a_end` covers both orderings in one expression, which
/// keeps boundary touches (`a_end == b_start`) out of the conflict set.
pub fn intervals_overlap(a_start: i64, a_duration: i64, b_start: i64, b_duration: i64) -> bool {
    a_start < b_start + b_duration && b_start < a_start + a_duration
}

/// First active reservation whose interval collides with the candidate slot.
///
/// The slice is expected to be pre-filtered to active reservations on the
/// candidate's table and date.
pub fn find_conflict(
    start_minute: i64,
    duration_minutes: i64,
    existing: &[Reservation],
) -> Option<&Reservation> {
    existing.iter().find(|r| {
        intervals_overlap(start_minute, duration_minutes, r.start_minute, r.duration_minutes)
    })
}

/// Validate a candidate slot before any storage read.
///
/// Rejections here are [`SchedulingError::Validation`], deliberately distinct
/// from a genuine conflict and from a storage failure.
pub fn validate_slot(start_minute: i64, duration_minutes: i64) -> SchedulingResult<()> {
    if !(0..MINUTES_PER_DAY).contains(&start_minute) {
        return Err(SchedulingError::Validation(format!(
            "start_minute out of range: {start_minute}"
        )));
    }
    if duration_minutes <= 0 {
        return Err(SchedulingError::Validation(format!(
            "duration_minutes must be positive, got {duration_minutes}"
        )));
    }
    if start_minute + duration_minutes > MINUTES_PER_DAY {
        return Err(SchedulingError::Validation(format!(
            "Reservation must end within its calendar day ({} + {} > {})",
            start_minute, duration_minutes, MINUTES_PER_DAY
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_intervals_conflict() {
        // 18:00-19:00 vs 18:30-19:00
        assert!(intervals_overlap(1080, 60, 1110, 30));
        // containment
        assert!(intervals_overlap(1080, 120, 1110, 30));
        // identical
        assert!(intervals_overlap(600, 90, 600, 90));
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        // 18:00-19:00 then 19:00-19:30
        assert!(!intervals_overlap(1080, 60, 1140, 30));
        // and in the other order
        assert!(!intervals_overlap(1140, 30, 1080, 60));
        // fully disjoint
        assert!(!intervals_overlap(600, 30, 720, 30));
    }

    #[test]
    fn overlap_test_is_symmetric() {
        let cases = [
            (1080, 60, 1110, 30),
            (1080, 60, 1140, 30),
            (600, 90, 600, 90),
            (0, 1, 1, 1),
            (100, 50, 10, 500),
        ];
        for (a_start, a_dur, b_start, b_dur) in cases {
            assert_eq!(
                intervals_overlap(a_start, a_dur, b_start, b_dur),
                intervals_overlap(b_start, b_dur, a_start, a_dur),
                "asymmetric verdict for ({a_start},{a_dur}) vs ({b_start},{b_dur})"
            );
        }
    }

    #[test]
    fn slot_validation() {
        assert!(validate_slot(0, 60).is_ok());
        assert!(validate_slot(1380, 60).is_ok()); // 23:00 + 60min = exactly midnight

        assert!(matches!(
            validate_slot(-10, 60),
            Err(SchedulingError::Validation(_))
        ));
        assert!(matches!(
            validate_slot(1440, 30),
            Err(SchedulingError::Validation(_))
        ));
        assert!(matches!(
            validate_slot(600, 0),
            Err(SchedulingError::Validation(_))
        ));
        assert!(matches!(
            validate_slot(600, -30),
            Err(SchedulingError::Validation(_))
        ));
        // spills past midnight
        assert!(matches!(
            validate_slot(1410, 60),
            Err(SchedulingError::Validation(_))
        ));
    }
}
