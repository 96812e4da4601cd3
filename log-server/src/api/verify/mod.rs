//! Verify API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// 完整性校验路由 - 公共路由（审计方无需写权限即可校验）
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/v1/verify/{log_id}", get(handler::verify))
}
