//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatusOverride};

use crate::api::ensure_admin;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{dining_table, reservation};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "dining_table";

/// GET /api/tables - 获取所有桌台
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = dining_table::find_all(&state.pool).await?;
    Ok(Json(tables))
}

/// GET /api/tables/:id - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", id)))?;
    Ok(Json(table))
}

/// POST /api/tables - 创建桌台 (admin)
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    ensure_admin(&current_user)?;

    let table = dining_table::create(&state.pool, payload).await?;

    let id = table.id.to_string();
    state.broadcast_sync(RESOURCE, "created", &id, Some(&table));

    Ok(Json(table))
}

/// PUT /api/tables/:id - 更新桌台 (admin)
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    ensure_admin(&current_user)?;

    let table = dining_table::update(&state.pool, id, payload).await?;

    state.broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&table));

    Ok(Json(table))
}

/// DELETE /api/tables/:id - 删除桌台 (admin)
///
/// 仍有未完结预订的桌台不可删除。
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    ensure_admin(&current_user)?;

    if reservation::has_active_for_table(&state.pool, id).await? {
        return Err(AppError::validation(format!(
            "Table {} has active reservations and cannot be deleted",
            id
        )));
    }

    let result = dining_table::delete(&state.pool, id).await?;

    if result {
        state.broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None);
    }

    Ok(Json(result))
}

/// PUT /api/tables/:id/status - 管理员状态覆写 (admin)
///
/// 桌台状态正常由 deriver 维护；这是唯一的人工后门，下一次对账会把
/// 状态重新拉回推导值。
pub async fn override_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<TableStatusOverride>,
) -> AppResult<Json<DiningTable>> {
    ensure_admin(&current_user)?;

    let existing = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", id)))?;

    dining_table::set_status(&state.pool, id, payload.status).await?;
    tracing::warn!(
        table_id = id,
        from = %existing.status,
        to = %payload.status,
        operator = %current_user.username,
        "Manual table status override"
    );

    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", id)))?;

    state.broadcast_sync(RESOURCE, "status_changed", &id.to_string(), Some(&table));

    Ok(Json(table))
}
