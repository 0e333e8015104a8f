//! Read-side composition
//!
//! Joins table info onto reservations for display. This is presentation-only;
//! the scheduling core never composes entities.

use std::collections::HashMap;

use sqlx::SqlitePool;

use shared::models::{Reservation, ReservationView};

use crate::db::repository::dining_table;
use crate::utils::time;
use crate::utils::{AppError, AppResult};

fn build_view(reservation: Reservation, table_number: Option<i64>) -> ReservationView {
    ReservationView {
        id: reservation.id,
        table_id: reservation.table_id,
        table_number,
        user_id: reservation.user_id,
        date: reservation.date,
        start_time: time::format_minute(reservation.start_minute),
        end_time: time::format_minute(reservation.start_minute + reservation.duration_minutes),
        duration_minutes: reservation.duration_minutes,
        guest_count: reservation.guest_count,
        status: reservation.status,
        notes: reservation.notes,
        created_at: reservation.created_at,
        updated_at: reservation.updated_at,
    }
}

/// Compose one reservation with its table's number.
pub async fn reservation_view(
    pool: &SqlitePool,
    reservation: Reservation,
) -> AppResult<ReservationView> {
    let table = dining_table::find_by_id(pool, reservation.table_id)
        .await
        .map_err(AppError::from)?;
    Ok(build_view(reservation, table.map(|t| t.number)))
}

/// Compose a list of reservations, resolving table numbers in one query.
pub async fn reservation_views(
    pool: &SqlitePool,
    reservations: Vec<Reservation>,
) -> AppResult<Vec<ReservationView>> {
    let numbers: HashMap<i64, i64> = dining_table::find_all(pool)
        .await
        .map_err(AppError::from)?
        .into_iter()
        .map(|t| (t.id, t.number))
        .collect();

    Ok(reservations
        .into_iter()
        .map(|r| {
            let number = numbers.get(&r.table_id).copied();
            build_view(r, number)
        })
        .collect())
}
