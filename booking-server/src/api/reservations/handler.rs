//! Reservation API Handlers
//!
//! Thin wrappers over [`ReservationService`]: parse strings, enforce
//! ownership, broadcast change notifications. Lifecycle legality, capacity
//! and overlap all live in the service.

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use shared::models::{
    AvailabilityResult, ListScope, Reservation, ReservationCreate, ReservationStatus,
    ReservationStatusChange, ReservationUpdate, ReservationView,
};

use crate::api::{convert, ensure_admin};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::reservations::{NewReservation, ReservationPatch, ReservationService, TransitionOutcome};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult, time};

const RESOURCE: &str = "reservation";
const TABLE_RESOURCE: &str = "dining_table";

fn service(state: &ServerState) -> &ReservationService {
    &state.reservations
}

/// 本人或管理员才能读写一条预订
fn ensure_owner(user: &CurrentUser, reservation: &Reservation) -> AppResult<()> {
    if !user.owns_or_admin(&reservation.user_id) {
        return Err(AppError::forbidden("Not your reservation"));
    }
    Ok(())
}

/// Broadcast the reservation event plus any table status transitions.
fn broadcast_outcome(state: &ServerState, action: &str, outcome: &TransitionOutcome) {
    state.broadcast_sync(
        RESOURCE,
        action,
        &outcome.reservation.id.to_string(),
        Some(&outcome.reservation),
    );
    for change in &outcome.table_changes {
        state.broadcast_sync(
            TABLE_RESOURCE,
            "status_changed",
            &change.table_id.to_string(),
            Some(change),
        );
    }
}

/// Query params for availability checks
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub table_id: i64,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub start_time: String,
    pub duration_minutes: i64,
    /// Reservation id to exclude (update-in-place checks)
    pub exclude: Option<i64>,
}

/// GET /api/reservations/availability - 时段可用性检查
pub async fn availability(
    State(state): State<ServerState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityResult>> {
    let date = time::parse_date(&query.date)?;
    let start_minute = time::parse_hhmm(&query.start_time)?;

    let result = service(&state)
        .check_availability(
            query.table_id,
            date,
            start_minute,
            query.duration_minutes,
            query.exclude,
        )
        .await?;
    Ok(Json(result))
}

/// Query params for listing reservations
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub scope: Option<ListScope>,
}

/// GET /api/reservations - 预订列表
///
/// `scope=mine` (默认) 任何用户可用；`all` 和 `ongoing` 仅管理员。
pub async fn list(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<ReservationView>>> {
    let scope = query.scope.unwrap_or_default();
    if matches!(scope, ListScope::All | ListScope::Ongoing) {
        ensure_admin(&current_user)?;
    }

    let reservations = service(&state).list(scope, &current_user.id).await?;
    let views = convert::reservation_views(&state.pool, reservations).await?;
    Ok(Json(views))
}

/// GET /api/reservations/:id - 获取单条预订
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationView>> {
    let reservation = service(&state).get(id).await?;
    ensure_owner(&current_user, &reservation)?;

    let view = convert::reservation_view(&state.pool, reservation).await?;
    Ok(Json(view))
}

/// POST /api/reservations - 创建预订 (PENDING)
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ReservationCreate>,
) -> AppResult<Json<Reservation>> {
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let new = NewReservation {
        table_id: payload.table_id,
        date: time::parse_date(&payload.date)?,
        start_minute: time::parse_hhmm(&payload.start_time)?,
        duration_minutes: payload.duration_minutes,
        guest_count: payload.guest_count,
        notes: payload.notes,
    };

    let reservation = service(&state).create(&current_user.id, new).await?;

    state.broadcast_sync(
        RESOURCE,
        "created",
        &reservation.id.to_string(),
        Some(&reservation),
    );

    Ok(Json(reservation))
}

/// PUT /api/reservations/:id - 更新预订
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ReservationUpdate>,
) -> AppResult<Json<Reservation>> {
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let existing = service(&state).get(id).await?;
    ensure_owner(&current_user, &existing)?;

    let patch = ReservationPatch {
        table_id: payload.table_id,
        date: payload.date.as_deref().map(time::parse_date).transpose()?,
        start_minute: payload
            .start_time
            .as_deref()
            .map(time::parse_hhmm)
            .transpose()?,
        duration_minutes: payload.duration_minutes,
        guest_count: payload.guest_count,
        notes: payload.notes,
    };

    let now = time::local_now(state.config.timezone);
    let outcome = service(&state).update(id, patch, now).await?;

    broadcast_outcome(&state, "updated", &outcome);

    Ok(Json(outcome.reservation))
}

/// POST /api/reservations/:id/status - 生命周期转换
pub async fn set_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ReservationStatusChange>,
) -> AppResult<Json<Reservation>> {
    let existing = service(&state).get(id).await?;
    ensure_owner(&current_user, &existing)?;

    let now = time::local_now(state.config.timezone);
    let outcome = match payload.status {
        ReservationStatus::Confirmed => service(&state).confirm(id, now).await?,
        ReservationStatus::Cancelled => service(&state).cancel(id, now).await?,
        ReservationStatus::Completed => service(&state).complete(id, now).await?,
        ReservationStatus::Pending => {
            return Err(AppError::InvalidTransition(
                "PENDING is the initial state and cannot be a transition target".to_string(),
            ));
        }
    };

    broadcast_outcome(&state, "status_changed", &outcome);

    Ok(Json(outcome.reservation))
}

/// DELETE /api/reservations/:id - 取消预订
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    let existing = service(&state).get(id).await?;
    ensure_owner(&current_user, &existing)?;

    let now = time::local_now(state.config.timezone);
    let outcome = service(&state).cancel(id, now).await?;

    broadcast_outcome(&state, "cancelled", &outcome);

    Ok(Json(outcome.reservation))
}
