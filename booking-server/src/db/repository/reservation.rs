//! Reservation Repository

use super::RepoResult;
use chrono::NaiveDate;
use shared::models::{Reservation, ReservationStatus};
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(reservation)
}

/// Active (PENDING or CONFIRMED) reservations holding slots on a table/date,
/// optionally excluding one reservation id (update-in-place checks).
pub async fn find_active_for_table_on_date(
    pool: &SqlitePool,
    table_id: i64,
    date: NaiveDate,
    exclude: Option<i64>,
) -> RepoResult<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation WHERE table_id = ? AND date = ? AND status NOT IN ('CANCELLED', 'COMPLETED') AND id != ? ORDER BY start_minute",
    )
    .bind(table_id)
    .bind(date)
    // id != -1 matches everything: snowflake ids are positive
    .bind(exclude.unwrap_or(-1))
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}

/// Confirmed reservations for a table/date - the status deriver's input set.
pub async fn find_confirmed_for_table_on_date(
    pool: &SqlitePool,
    table_id: i64,
    date: NaiveDate,
) -> RepoResult<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation WHERE table_id = ? AND date = ? AND status = 'CONFIRMED' ORDER BY start_minute",
    )
    .bind(table_id)
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}

pub async fn insert(pool: &SqlitePool, reservation: &Reservation) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO reservation (id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reservation.id)
    .bind(reservation.table_id)
    .bind(&reservation.user_id)
    .bind(reservation.date)
    .bind(reservation.start_minute)
    .bind(reservation.duration_minutes)
    .bind(reservation.guest_count)
    .bind(reservation.status)
    .bind(&reservation.notes)
    .bind(reservation.created_at)
    .bind(reservation.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rewrite the schedule fields of a non-terminal reservation.
///
/// The `status NOT IN (...)` guard is the optimistic check: a reservation
/// that reached a terminal state between read and write is left untouched
/// and the caller sees `false`.
#[allow(clippy::too_many_arguments)]
pub async fn update_schedule(
    pool: &SqlitePool,
    id: i64,
    table_id: i64,
    date: NaiveDate,
    start_minute: i64,
    duration_minutes: i64,
    guest_count: i64,
    notes: Option<String>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE reservation SET table_id = ?, date = ?, start_minute = ?, duration_minutes = ?, guest_count = ?, notes = ?, updated_at = ? WHERE id = ? AND status NOT IN ('CANCELLED', 'COMPLETED')",
    )
    .bind(table_id)
    .bind(date)
    .bind(start_minute)
    .bind(duration_minutes)
    .bind(guest_count)
    .bind(notes)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Compare-and-swap status transition: only fires while the stored status
/// still equals `from`. Returns whether the row transitioned.
pub async fn set_status_if(
    pool: &SqlitePool,
    id: i64,
    from: ReservationStatus,
    to: ReservationStatus,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE reservation SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(to)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Confirmed reservations whose interval has fully elapsed: past dates, or
/// today with `start + duration <= now`. The reconciler's expire-pass input.
pub async fn find_expired_confirmed(
    pool: &SqlitePool,
    today: NaiveDate,
    now_minute: i64,
) -> RepoResult<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation WHERE status = 'CONFIRMED' AND (date < ? OR (date = ? AND start_minute + duration_minutes <= ?)) ORDER BY date, start_minute",
    )
    .bind(today)
    .bind(today)
    .bind(now_minute)
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}

pub async fn list_all(pool: &SqlitePool) -> RepoResult<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation ORDER BY date, start_minute",
    )
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}

pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> RepoResult<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation WHERE user_id = ? ORDER BY date, start_minute",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}

/// All reservations still in flight (PENDING or CONFIRMED).
pub async fn list_active(pool: &SqlitePool) -> RepoResult<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT id, table_id, user_id, date, start_minute, duration_minutes, guest_count, status, notes, created_at, updated_at FROM reservation WHERE status NOT IN ('CANCELLED', 'COMPLETED') ORDER BY date, start_minute",
    )
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}

pub async fn has_active_for_table(pool: &SqlitePool, table_id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reservation WHERE table_id = ? AND status NOT IN ('CANCELLED', 'COMPLETED')",
    )
    .bind(table_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}
