//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`tables`] - 桌台管理接口
//! - [`reservations`] - 预订管理接口
//! - [`sync`] - 资源变更 SSE 推送
//! - [`admin`] - 运维接口 (手动对账)

pub mod convert;

pub mod admin;
pub mod health;
pub mod reservations;
pub mod sync;
pub mod tables;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{CurrentUser, require_auth};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Assemble the full API router with auth, trace and CORS layers.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(tables::router())
        .merge(reservations::router())
        .merge(sync::router())
        .merge(admin::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Admin gate for handlers that share a path with non-admin methods.
pub fn ensure_admin(user: &CurrentUser) -> AppResult<()> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Administrator role required"));
    }
    Ok(())
}
