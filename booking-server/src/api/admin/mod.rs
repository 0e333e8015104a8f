//! 运维接口 (admin)

use axum::{Json, Router, extract::State, middleware, routing::post};

use crate::auth::require_admin;
use crate::core::ServerState;
use crate::reservations::ReconcileReport;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/admin/reconcile", post(reconcile))
        .route_layer(middleware::from_fn(require_admin))
}

/// POST /api/admin/reconcile - 立即触发一次对账
///
/// 与周期任务共用同一个 in-progress 守卫：已有一次对账在跑时直接拒绝，
/// 不排队。
async fn reconcile(State(state): State<ServerState>) -> AppResult<Json<ReconcileReport>> {
    match state.reconciler.run_once().await {
        Some(Ok(report)) => Ok(Json(report)),
        Some(Err(e)) => Err(e.into()),
        None => Err(AppError::Conflict(
            "A reconciliation run is already in progress".to_string(),
        )),
    }
}
