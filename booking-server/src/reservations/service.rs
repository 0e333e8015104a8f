//! Reservation lifecycle service
//!
//! Owns every mutation of reservations and of the derived table status:
//! create, confirm, cancel, complete, update, plus the reconciliation sweep.
//! Authorization (owner-or-admin) is the caller's job; this service only
//! enforces lifecycle legality, capacity and overlap invariants.
//!
//! 并发约定: 每个 read-check-write 序列都持有对应桌台的锁 (见 [`TableLocks`]),
//! 状态写入另带 compare-and-swap 守卫，过期的转换不会覆盖新状态。

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use shared::models::{
    AvailabilityResult, ListScope, Reservation, ReservationStatus, TableStatus,
};

use crate::db::repository::{dining_table, reservation};
use crate::utils::time;

use super::error::{SchedulingError, SchedulingResult};
use super::locks::TableLocks;
use super::{derive, overlap};

/// A resolved create request (string parsing happens at the handler layer).
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub table_id: i64,
    pub date: NaiveDate,
    pub start_minute: i64,
    pub duration_minutes: i64,
    pub guest_count: i64,
    pub notes: Option<String>,
}

/// A resolved partial update.
#[derive(Debug, Clone, Default)]
pub struct ReservationPatch {
    pub table_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub start_minute: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub guest_count: Option<i64>,
    pub notes: Option<String>,
}

/// A persisted table status transition, with the reservation that drove it.
#[derive(Debug, Clone, Serialize)]
pub struct TableStatusChange {
    pub table_id: i64,
    pub from: TableStatus,
    pub to: TableStatus,
    pub cause: Option<i64>,
}

/// Result of a lifecycle mutation: the reservation afterwards, plus any table
/// status transitions it triggered (two entries when a reservation moved
/// between tables).
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub reservation: Reservation,
    pub table_changes: Vec<TableStatusChange>,
}

/// Summary of one reconciliation sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Reservations auto-completed by the expire pass
    pub completed: Vec<i64>,
    /// Table status corrections from both passes
    pub table_changes: Vec<TableStatusChange>,
    /// Items that failed and were skipped (the sweep continues past them)
    pub failed_items: usize,
}

impl ReconcileReport {
    /// True when the sweep wrote nothing (used by idempotence checks).
    pub fn is_noop(&self) -> bool {
        self.completed.is_empty() && self.table_changes.is_empty()
    }
}

#[derive(Clone)]
pub struct ReservationService {
    pool: SqlitePool,
    locks: Arc<TableLocks>,
}

impl ReservationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: Arc::new(TableLocks::new()),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get(&self, id: i64) -> SchedulingResult<Reservation> {
        reservation::find_by_id(&self.pool, id)
            .await?
            .ok_or(SchedulingError::ReservationNotFound(id))
    }

    pub async fn list(&self, scope: ListScope, user_id: &str) -> SchedulingResult<Vec<Reservation>> {
        let reservations = match scope {
            ListScope::All => reservation::list_all(&self.pool).await?,
            ListScope::Mine => reservation::list_for_user(&self.pool, user_id).await?,
            ListScope::Ongoing => reservation::list_active(&self.pool).await?,
        };
        Ok(reservations)
    }

    /// Availability check for a candidate slot (read-only).
    ///
    /// Update-in-place checks pass `exclude` so a reservation does not
    /// conflict with itself.
    pub async fn check_availability(
        &self,
        table_id: i64,
        date: NaiveDate,
        start_minute: i64,
        duration_minutes: i64,
        exclude: Option<i64>,
    ) -> SchedulingResult<AvailabilityResult> {
        overlap::validate_slot(start_minute, duration_minutes)?;
        if dining_table::find_by_id(&self.pool, table_id).await?.is_none() {
            return Err(SchedulingError::TableNotFound(table_id));
        }

        let existing =
            reservation::find_active_for_table_on_date(&self.pool, table_id, date, exclude).await?;
        match overlap::find_conflict(start_minute, duration_minutes, &existing) {
            Some(conflicting) => Ok(AvailabilityResult {
                available: false,
                conflicting: Some(conflicting.clone()),
            }),
            None => Ok(AvailabilityResult {
                available: true,
                conflicting: None,
            }),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a reservation in PENDING state.
    ///
    /// Validates capacity and overlap, but deliberately does not touch the
    /// table's status: a future-dated pending booking must not block walk-ins.
    pub async fn create(
        &self,
        user_id: &str,
        new: NewReservation,
    ) -> SchedulingResult<Reservation> {
        overlap::validate_slot(new.start_minute, new.duration_minutes)?;
        if new.guest_count <= 0 {
            return Err(SchedulingError::Validation(format!(
                "guest_count must be positive, got {}",
                new.guest_count
            )));
        }

        let _guard = self.locks.lock(new.table_id).await;

        let table = dining_table::find_by_id(&self.pool, new.table_id)
            .await?
            .ok_or(SchedulingError::TableNotFound(new.table_id))?;
        if new.guest_count > table.capacity {
            return Err(SchedulingError::CapacityExceeded {
                guest_count: new.guest_count,
                capacity: table.capacity,
            });
        }

        let existing =
            reservation::find_active_for_table_on_date(&self.pool, new.table_id, new.date, None)
                .await?;
        if let Some(conflicting) =
            overlap::find_conflict(new.start_minute, new.duration_minutes, &existing)
        {
            return Err(SchedulingError::Conflict(Box::new(conflicting.clone())));
        }

        let now = shared::util::now_millis();
        let record = Reservation {
            id: shared::util::snowflake_id(),
            table_id: new.table_id,
            user_id: user_id.to_string(),
            date: new.date,
            start_minute: new.start_minute,
            duration_minutes: new.duration_minutes,
            guest_count: new.guest_count,
            status: ReservationStatus::Pending,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        reservation::insert(&self.pool, &record).await?;

        info!(
            reservation_id = record.id,
            table_id = record.table_id,
            date = %record.date,
            start = %time::format_minute(record.start_minute),
            duration = record.duration_minutes,
            "Reservation created (PENDING)"
        );
        Ok(record)
    }

    /// PENDING → CONFIRMED
    pub async fn confirm(&self, id: i64, now: NaiveDateTime) -> SchedulingResult<TransitionOutcome> {
        self.transition(id, ReservationStatus::Confirmed, now).await
    }

    /// PENDING | CONFIRMED → CANCELLED
    pub async fn cancel(&self, id: i64, now: NaiveDateTime) -> SchedulingResult<TransitionOutcome> {
        self.transition(id, ReservationStatus::Cancelled, now).await
    }

    /// CONFIRMED → COMPLETED (explicit action or reconciler expire pass)
    pub async fn complete(&self, id: i64, now: NaiveDateTime) -> SchedulingResult<TransitionOutcome> {
        self.transition(id, ReservationStatus::Completed, now).await
    }

    async fn transition(
        &self,
        id: i64,
        to: ReservationStatus,
        now: NaiveDateTime,
    ) -> SchedulingResult<TransitionOutcome> {
        let existing = self.get(id).await?;
        let from = existing.status;
        if !from.can_transition_to(to) {
            return Err(SchedulingError::InvalidTransition { from, to });
        }

        let _guard = self.locks.lock(existing.table_id).await;

        // CAS: if the status moved under us, report against the fresh value
        if !reservation::set_status_if(&self.pool, id, from, to).await? {
            let current = self.get(id).await?;
            return Err(SchedulingError::InvalidTransition {
                from: current.status,
                to,
            });
        }
        info!(reservation_id = id, %from, %to, "Reservation transition");

        let table_changes = self
            .apply_table_status_locked(existing.table_id, now)
            .await?
            .into_iter()
            .collect();

        let reservation = self.get(id).await?;
        Ok(TransitionOutcome {
            reservation,
            table_changes,
        })
    }

    /// Update schedule fields of a non-terminal reservation.
    ///
    /// Overlap is re-checked only when date/time/duration/table actually
    /// change (excluding self, against the prospective table); capacity is
    /// re-checked whenever guest_count or the table changes. A notes-only
    /// update touches nothing else.
    pub async fn update(
        &self,
        id: i64,
        patch: ReservationPatch,
        now: NaiveDateTime,
    ) -> SchedulingResult<TransitionOutcome> {
        let existing = self.get(id).await?;
        if existing.status.is_terminal() {
            return Err(SchedulingError::Terminal(existing.status));
        }

        // Prospective values
        let table_id = patch.table_id.unwrap_or(existing.table_id);
        let date = patch.date.unwrap_or(existing.date);
        let start_minute = patch.start_minute.unwrap_or(existing.start_minute);
        let duration_minutes = patch.duration_minutes.unwrap_or(existing.duration_minutes);
        let guest_count = patch.guest_count.unwrap_or(existing.guest_count);
        let notes = patch.notes.or_else(|| existing.notes.clone());

        let table_changed = table_id != existing.table_id;
        let schedule_changed = table_changed
            || date != existing.date
            || start_minute != existing.start_minute
            || duration_minutes != existing.duration_minutes;
        let guests_changed = guest_count != existing.guest_count;

        if guest_count <= 0 {
            return Err(SchedulingError::Validation(format!(
                "guest_count must be positive, got {guest_count}"
            )));
        }

        let (_guard, _second_guard) = self.locks.lock_pair(existing.table_id, table_id).await;

        if guests_changed || table_changed {
            let table = dining_table::find_by_id(&self.pool, table_id)
                .await?
                .ok_or(SchedulingError::TableNotFound(table_id))?;
            if guest_count > table.capacity {
                return Err(SchedulingError::CapacityExceeded {
                    guest_count,
                    capacity: table.capacity,
                });
            }
        }

        if schedule_changed {
            overlap::validate_slot(start_minute, duration_minutes)?;
            let others =
                reservation::find_active_for_table_on_date(&self.pool, table_id, date, Some(id))
                    .await?;
            if let Some(conflicting) = overlap::find_conflict(start_minute, duration_minutes, &others)
            {
                return Err(SchedulingError::Conflict(Box::new(conflicting.clone())));
            }
        }

        // Optimistic write: bails out if the reservation went terminal meanwhile
        let written = reservation::update_schedule(
            &self.pool,
            id,
            table_id,
            date,
            start_minute,
            duration_minutes,
            guest_count,
            notes,
        )
        .await?;
        if !written {
            let current = self.get(id).await?;
            return Err(SchedulingError::Terminal(current.status));
        }
        info!(
            reservation_id = id,
            table_id,
            schedule_changed,
            "Reservation updated"
        );

        // Only confirmed reservations drive table status; re-derive the new
        // table and, on a move, the old one as well.
        let mut table_changes = Vec::new();
        if existing.status == ReservationStatus::Confirmed {
            if let Some(change) = self.apply_table_status_locked(table_id, now).await? {
                table_changes.push(change);
            }
            if table_changed {
                if let Some(change) = self
                    .apply_table_status_locked(existing.table_id, now)
                    .await?
                {
                    table_changes.push(change);
                }
            }
        }

        let reservation = self.get(id).await?;
        Ok(TransitionOutcome {
            reservation,
            table_changes,
        })
    }

    // ========================================================================
    // Derived table status
    // ========================================================================

    /// Recompute a table's status at `now` and persist it when it differs
    /// from the stored value. Takes the table lock.
    pub async fn apply_table_status(
        &self,
        table_id: i64,
        now: NaiveDateTime,
    ) -> SchedulingResult<Option<TableStatusChange>> {
        let _guard = self.locks.lock(table_id).await;
        self.apply_table_status_locked(table_id, now).await
    }

    /// Same as [`apply_table_status`], for callers already holding the lock
    /// (the table mutex is not reentrant).
    async fn apply_table_status_locked(
        &self,
        table_id: i64,
        now: NaiveDateTime,
    ) -> SchedulingResult<Option<TableStatusChange>> {
        let table = dining_table::find_by_id(&self.pool, table_id)
            .await?
            .ok_or(SchedulingError::TableNotFound(table_id))?;

        let (today, now_minute) = time::date_and_minute(now);
        let confirmed =
            reservation::find_confirmed_for_table_on_date(&self.pool, table_id, today).await?;
        let derived = derive::derive_status(&confirmed, now_minute);

        if derived.status == table.status {
            return Ok(None);
        }

        let changed = dining_table::set_status(&self.pool, table_id, derived.status).await?;
        if !changed {
            return Ok(None);
        }

        info!(
            table_id,
            from = %table.status,
            to = %derived.status,
            cause = ?derived.cause,
            "Table status transition"
        );
        Ok(Some(TableStatusChange {
            table_id,
            from: table.status,
            to: derived.status,
            cause: derived.cause,
        }))
    }

    // ========================================================================
    // Reconciliation sweep
    // ========================================================================

    /// One full reconciliation sweep at `now`: expire pass, then reconcile
    /// pass over every table. Item failures are logged and skipped so one bad
    /// record cannot stall the sweep; a failure to even enumerate the work is
    /// returned to the caller (pass failure, retried next tick).
    pub async fn reconcile_at(&self, now: NaiveDateTime) -> SchedulingResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let (today, now_minute) = time::date_and_minute(now);

        // 1. Expire pass: elapsed confirmed reservations → COMPLETED
        let expired = reservation::find_expired_confirmed(&self.pool, today, now_minute).await?;
        for r in expired {
            match self.complete(r.id, now).await {
                Ok(outcome) => {
                    report.completed.push(r.id);
                    report.table_changes.extend(outcome.table_changes);
                }
                Err(e) => {
                    warn!(
                        reservation_id = r.id,
                        error = %e,
                        "Expire pass: failed to complete reservation, skipping"
                    );
                    report.failed_items += 1;
                }
            }
        }

        // 2. Reconcile pass: re-derive every table
        let tables = dining_table::find_all(&self.pool).await?;
        for table in tables {
            match self.apply_table_status(table.id, now).await {
                Ok(Some(change)) => report.table_changes.push(change),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        table_id = table.id,
                        error = %e,
                        "Reconcile pass: failed to derive table status, skipping"
                    );
                    report.failed_items += 1;
                }
            }
        }

        Ok(report)
    }
}
