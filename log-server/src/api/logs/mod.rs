//! Log API 模块

mod handler;

use axum::{Router, routing::get, routing::put};

use crate::core::ServerState;

/// 日志读写路由 — 全部需要认证
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/v1/logs", put(handler::create))
        .route("/api/v1/logs", get(handler::list))
}
