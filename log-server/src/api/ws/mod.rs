//! 实时订阅端点
//!
//! # 路由列表
//!
//! | 路径 | 说明 |
//! |------|------|
//! | /ws/logs | 快照 + 实时：首帧 `logs_response`，随后裸条目/心跳 |
//! | /ws/stream | 仅实时：可选首帧 `initial_logs`，随后裸条目/心跳 |
//! | /api/v1/websocket-info | 端点说明（机器可读） |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/ws/logs", get(handler::logs_socket))
        .route("/ws/stream", get(handler::stream_socket))
        .route("/api/v1/websocket-info", get(handler::websocket_info))
}
