//! Reservation core tests
//!
//! Service-level tests against an in-memory SQLite database with the real
//! migrations applied. `now` is always passed explicitly, so no clock mocking
//! is needed anywhere.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;

use shared::models::{DiningTableCreate, ReservationStatus, TableStatus};

use crate::core::state::SyncHub;
use crate::db::DbService;
use crate::db::repository::dining_table;

use super::reconciler::Reconciler;
use super::service::{NewReservation, ReservationPatch, ReservationService};
use super::SchedulingError;

async fn test_service() -> (ReservationService, SqlitePool) {
    let db = DbService::in_memory().await.expect("in-memory db");
    (ReservationService::new(db.pool.clone()), db.pool)
}

async fn seed_table(pool: &SqlitePool, number: i64, capacity: i64) -> i64 {
    dining_table::create(
        pool,
        DiningTableCreate {
            number,
            capacity: Some(capacity),
        },
    )
    .await
    .expect("seed table")
    .id
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
}

fn minute(hour: u32, min: u32) -> i64 {
    hour as i64 * 60 + min as i64
}

fn at(hour: u32, min: u32) -> NaiveDateTime {
    day().and_hms_opt(hour, min, 0).unwrap()
}

fn booking(table_id: i64, start: i64, duration: i64, guests: i64) -> NewReservation {
    NewReservation {
        table_id,
        date: day(),
        start_minute: start,
        duration_minutes: duration,
        guest_count: guests,
        notes: None,
    }
}

async fn table_status(pool: &SqlitePool, table_id: i64) -> TableStatus {
    dining_table::find_by_id(pool, table_id)
        .await
        .unwrap()
        .unwrap()
        .status
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_is_pending_and_does_not_touch_table_status() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let created = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();

    assert_eq!(created.status, ReservationStatus::Pending);
    assert_eq!(created.table_id, table_id);
    // Future-dated pending bookings must not block walk-ins
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Available);
}

#[tokio::test]
async fn create_rejects_capacity_exceeded() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let result = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 5))
        .await;

    assert!(matches!(
        result,
        Err(SchedulingError::CapacityExceeded {
            guest_count: 5,
            capacity: 4
        })
    ));
}

#[tokio::test]
async fn create_rejects_unknown_table() {
    let (service, _pool) = test_service().await;

    let result = service.create("user-1", booking(999, minute(18, 0), 60, 2)).await;

    assert!(matches!(result, Err(SchedulingError::TableNotFound(999))));
}

#[tokio::test]
async fn create_rejects_invalid_slot_before_storage() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let result = service
        .create("user-1", booking(table_id, minute(23, 30), 60, 2))
        .await;

    // Spills past midnight: validation error, not a conflict
    assert!(matches!(result, Err(SchedulingError::Validation(_))));
}

#[tokio::test]
async fn overlapping_booking_rejected_touching_accepted() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    // A: 18:00, 60 min, confirmed
    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(12, 0)).await.unwrap();

    // B: 18:30, 30 min - overlaps A's 18:00-19:00
    let b = service
        .create("user-2", booking(table_id, minute(18, 30), 30, 2))
        .await;
    match b {
        Err(SchedulingError::Conflict(conflicting)) => assert_eq!(conflicting.id, a.id),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // C: 19:00, 30 min - touches A's end, half-open semantics, no overlap
    let c = service
        .create("user-2", booking(table_id, minute(19, 0), 30, 2))
        .await;
    assert!(c.is_ok());
}

#[tokio::test]
async fn pending_bookings_hold_their_slot() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();

    // Still pending, but the slot is taken
    let result = service
        .create("user-2", booking(table_id, minute(18, 30), 60, 2))
        .await;
    assert!(matches!(result, Err(SchedulingError::Conflict(_))));
}

#[tokio::test]
async fn same_slot_on_other_table_is_free() {
    let (service, pool) = test_service().await;
    let t1 = seed_table(&pool, 1, 4).await;
    let t2 = seed_table(&pool, 2, 4).await;

    service
        .create("user-1", booking(t1, minute(18, 0), 60, 2))
        .await
        .unwrap();
    let result = service
        .create("user-2", booking(t2, minute(18, 0), 60, 2))
        .await;
    assert!(result.is_ok());
}

// ============================================================================
// Availability check
// ============================================================================

#[tokio::test]
async fn availability_distinguishes_conflict_from_bad_input() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();

    // Genuine conflict: available=false with the conflicting reservation
    let result = service
        .check_availability(table_id, day(), minute(18, 30), 30, None)
        .await
        .unwrap();
    assert!(!result.available);
    assert_eq!(result.conflicting.as_ref().map(|r| r.id), Some(a.id));

    // Free slot
    let result = service
        .check_availability(table_id, day(), minute(19, 0), 30, None)
        .await
        .unwrap();
    assert!(result.available);
    assert!(result.conflicting.is_none());

    // Bad input: validation error, not a conflict verdict
    let result = service
        .check_availability(table_id, day(), minute(18, 30), 0, None)
        .await;
    assert!(matches!(result, Err(SchedulingError::Validation(_))));

    // Excluding self: a reservation does not conflict with itself
    let result = service
        .check_availability(table_id, day(), minute(18, 0), 60, Some(a.id))
        .await
        .unwrap();
    assert!(result.available);
}

// ============================================================================
// Transitions and table status derivation
// ============================================================================

#[tokio::test]
async fn confirm_inside_window_occupies_table() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(14, 0), 60, 2))
        .await
        .unwrap();

    let outcome = service.confirm(a.id, at(14, 30)).await.unwrap();
    assert_eq!(outcome.reservation.status, ReservationStatus::Confirmed);
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Occupied);
    assert_eq!(outcome.table_changes.len(), 1);
    assert_eq!(outcome.table_changes[0].cause, Some(a.id));
}

#[tokio::test]
async fn confirm_far_ahead_reserves_then_buffer_occupies() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(14, 0), 60, 2))
        .await
        .unwrap();

    // 12:30 - 90 minutes out: reserved, not yet blocking
    service.confirm(a.id, at(12, 30)).await.unwrap();
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Reserved);

    // 13:05 - 55 minutes out: inside the pre-arrival buffer
    service.apply_table_status(table_id, at(13, 5)).await.unwrap();
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Occupied);
}

#[tokio::test]
async fn invalid_transitions_rejected() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();

    // pending → completed is illegal
    assert!(matches!(
        service.complete(a.id, at(12, 0)).await,
        Err(SchedulingError::InvalidTransition { .. })
    ));

    // cancelled is terminal
    service.cancel(a.id, at(12, 0)).await.unwrap();
    assert!(matches!(
        service.confirm(a.id, at(12, 0)).await,
        Err(SchedulingError::InvalidTransition { .. })
    ));
    assert!(matches!(
        service.cancel(a.id, at(12, 0)).await,
        Err(SchedulingError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn cancel_releases_table() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(14, 0), 60, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(14, 10)).await.unwrap();
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Occupied);

    let outcome = service.cancel(a.id, at(14, 20)).await.unwrap();
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Available);
    assert_eq!(outcome.table_changes.len(), 1);
}

#[tokio::test]
async fn cancel_falls_back_to_remaining_reservations() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(14, 0), 60, 2))
        .await
        .unwrap();
    let b = service
        .create("user-2", booking(table_id, minute(15, 30), 60, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(14, 10)).await.unwrap();
    service.confirm(b.id, at(14, 15)).await.unwrap();

    // Cancelling the current booking at 14:40: B starts at 15:30, 50 minutes
    // out, inside the pre-arrival buffer → still occupied, now because of B
    service.cancel(a.id, at(14, 40)).await.unwrap();
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Occupied);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_time_change_rechecks_overlap() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(12, 0)).await.unwrap();

    // B touches A's end - legal
    let b = service
        .create("user-2", booking(table_id, minute(19, 0), 30, 2))
        .await
        .unwrap();

    // Moving B's start back into A's window is a conflict
    let patch = ReservationPatch {
        start_minute: Some(minute(18, 30)),
        ..Default::default()
    };
    let result = service.update(b.id, patch, at(12, 0)).await;
    match result {
        Err(SchedulingError::Conflict(conflicting)) => assert_eq!(conflicting.id, a.id),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn update_notes_only_never_rechecks_overlap() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();
    let b = service
        .create("user-2", booking(table_id, minute(19, 0), 30, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(12, 0)).await.unwrap();
    service.confirm(b.id, at(12, 0)).await.unwrap();

    // Notes-only update on a reservation sitting flush against another:
    // no overlap re-check, no conflict
    let patch = ReservationPatch {
        notes: Some("window seat please".to_string()),
        ..Default::default()
    };
    let outcome = service.update(b.id, patch, at(12, 0)).await.unwrap();
    assert_eq!(
        outcome.reservation.notes.as_deref(),
        Some("window seat please")
    );
    assert_eq!(outcome.reservation.start_minute, minute(19, 0));
}

#[tokio::test]
async fn update_excludes_self_from_overlap_check() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();

    // Shrinking the booking overlaps its own old interval; must not
    // self-conflict
    let patch = ReservationPatch {
        duration_minutes: Some(30),
        ..Default::default()
    };
    let outcome = service.update(a.id, patch, at(12, 0)).await.unwrap();
    assert_eq!(outcome.reservation.duration_minutes, 30);
}

#[tokio::test]
async fn update_guest_count_rechecks_capacity() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();

    let patch = ReservationPatch {
        guest_count: Some(6),
        ..Default::default()
    };
    assert!(matches!(
        service.update(a.id, patch, at(12, 0)).await,
        Err(SchedulingError::CapacityExceeded { .. })
    ));
}

#[tokio::test]
async fn update_table_move_rechecks_new_table_and_rederives_both() {
    let (service, pool) = test_service().await;
    let t1 = seed_table(&pool, 1, 4).await;
    let t2 = seed_table(&pool, 2, 2).await;

    let a = service
        .create("user-1", booking(t1, minute(14, 0), 60, 4))
        .await
        .unwrap();
    service.confirm(a.id, at(14, 10)).await.unwrap();
    assert_eq!(table_status(&pool, t1).await, TableStatus::Occupied);

    // 4 guests do not fit the 2-seat target table
    let patch = ReservationPatch {
        table_id: Some(t2),
        ..Default::default()
    };
    assert!(matches!(
        service.update(a.id, patch, at(14, 20)).await,
        Err(SchedulingError::CapacityExceeded { .. })
    ));

    // With a fitting party size the move succeeds and both tables re-derive
    let patch = ReservationPatch {
        table_id: Some(t2),
        guest_count: Some(2),
        ..Default::default()
    };
    let outcome = service.update(a.id, patch, at(14, 20)).await.unwrap();
    assert_eq!(outcome.reservation.table_id, t2);
    assert_eq!(outcome.table_changes.len(), 2);
    assert_eq!(table_status(&pool, t2).await, TableStatus::Occupied);
    assert_eq!(table_status(&pool, t1).await, TableStatus::Available);
}

#[tokio::test]
async fn update_terminal_reservation_rejected() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(18, 0), 60, 2))
        .await
        .unwrap();
    service.cancel(a.id, at(12, 0)).await.unwrap();

    let patch = ReservationPatch {
        notes: Some("too late".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        service.update(a.id, patch, at(12, 0)).await,
        Err(SchedulingError::Terminal(ReservationStatus::Cancelled))
    ));
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn reconcile_expires_elapsed_reservations_and_frees_tables() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(10, 0), 60, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(10, 30)).await.unwrap();
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Occupied);

    // Hours later, nothing signalled the expiry - the sweep catches it
    let report = service.reconcile_at(at(15, 30)).await.unwrap();
    assert_eq!(report.completed, vec![a.id]);
    assert_eq!(report.failed_items, 0);
    assert_eq!(
        service.get(a.id).await.unwrap().status,
        ReservationStatus::Completed
    );
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Available);
}

#[tokio::test]
async fn reconcile_expires_past_date_reservations() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let yesterday = day().pred_opt().unwrap();
    let a = service
        .create(
            "user-1",
            NewReservation {
                table_id,
                date: yesterday,
                start_minute: minute(20, 0),
                duration_minutes: 90,
                guest_count: 2,
                notes: None,
            },
        )
        .await
        .unwrap();
    service.confirm(a.id, at(9, 0)).await.unwrap();

    let report = service.reconcile_at(at(9, 30)).await.unwrap();
    assert_eq!(report.completed, vec![a.id]);
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    let a = service
        .create("user-1", booking(table_id, minute(10, 0), 60, 2))
        .await
        .unwrap();
    service.confirm(a.id, at(10, 30)).await.unwrap();

    let first = service.reconcile_at(at(15, 30)).await.unwrap();
    assert!(!first.is_noop());

    // Immediate second sweep with no intervening change: zero writes
    let second = service.reconcile_at(at(15, 30)).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(second.failed_items, 0);
}

#[tokio::test]
async fn reconcile_corrects_manual_override_drift() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    // Admin override marks the table occupied with no reservation backing it
    dining_table::set_status(&pool, table_id, TableStatus::Occupied)
        .await
        .unwrap();

    let report = service.reconcile_at(at(12, 0)).await.unwrap();
    assert_eq!(report.table_changes.len(), 1);
    assert_eq!(report.table_changes[0].to, TableStatus::Available);
    assert_eq!(table_status(&pool, table_id).await, TableStatus::Available);
}

#[tokio::test]
async fn reconciler_guarded_run_reports_and_noops() {
    let (service, pool) = test_service().await;
    let table_id = seed_table(&pool, 1, 4).await;

    // Far-past booking so the reconciler's wall-clock sweep always expires it
    let a = service
        .create(
            "user-1",
            NewReservation {
                table_id,
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                start_minute: minute(10, 0),
                duration_minutes: 60,
                guest_count: 2,
                notes: None,
            },
        )
        .await
        .unwrap();
    service.confirm(a.id, at(10, 30)).await.unwrap();

    let reconciler = Reconciler::new(
        service.clone(),
        Arc::new(SyncHub::new()),
        300,
        chrono_tz::Tz::UTC,
    );

    let first = reconciler.run_once().await.expect("not skipped").unwrap();
    assert_eq!(first.completed, vec![a.id]);

    let second = reconciler.run_once().await.expect("not skipped").unwrap();
    assert!(second.is_noop());
}
