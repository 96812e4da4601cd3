//! WebSocket upgrade handlers
//!
//! Query 参数解析 + upgrade；连接生命周期在 [`hub::socket`] 里。

use axum::{
    Json,
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::hub::SubscriptionMode;
use crate::hub::socket::serve_connection;

/// /ws/logs 查询参数
#[derive(Debug, Deserialize)]
pub struct LogsSocketParams {
    /// 按操作主体过滤（缺省全量）
    pub user_id: Option<String>,
    /// 快照窗口大小（缺省用配置默认值）
    pub limit: Option<usize>,
    /// 快照窗口偏移
    #[serde(default)]
    pub offset: usize,
}

/// /ws/stream 查询参数
#[derive(Debug, Deserialize)]
pub struct StreamSocketParams {
    /// 按操作主体过滤（缺省全量）
    pub user_id: Option<String>,
}

/// GET /ws/logs — 快照 + 实时订阅
pub async fn logs_socket(
    State(state): State<ServerState>,
    Query(params): Query<LogsSocketParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let limit = params.limit.unwrap_or(state.config.default_page_limit);
    ws.on_upgrade(move |socket| {
        serve_connection(
            state,
            socket,
            params.user_id,
            limit,
            params.offset,
            SubscriptionMode::SnapshotThenLive,
        )
    })
}

/// GET /ws/stream — 仅实时订阅
pub async fn stream_socket(
    State(state): State<ServerState>,
    Query(params): Query<StreamSocketParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| {
        serve_connection(
            state,
            socket,
            params.user_id,
            0,
            0,
            SubscriptionMode::LiveOnly,
        )
    })
}

/// GET /api/v1/websocket-info — 订阅端点说明
///
/// WebSocket 端点不会出现在常规 OpenAPI 文档里，这里给出机器可读
/// 的端点/参数/消息类型描述。
pub async fn websocket_info(State(state): State<ServerState>) -> Json<serde_json::Value> {
    let port = state.config.http_port;
    Json(serde_json::json!({
        "websocket_endpoints": {
            "logs": {
                "url": format!("ws://localhost:{}/ws/logs", port),
                "description": "Paginated snapshot followed by real-time updates",
                "parameters": {
                    "user_id": "Optional - Filter logs by user",
                    "limit": format!("Optional - Snapshot window size (default: {})", state.config.default_page_limit),
                    "offset": "Optional - Snapshot window offset (default: 0)"
                }
            },
            "stream": {
                "url": format!("ws://localhost:{}/ws/stream", port),
                "description": "Real-time log stream only (bounded initial batch)",
                "parameters": {
                    "user_id": "Optional - Filter real-time updates by user"
                }
            }
        },
        "message_types": {
            "logs_response": "Initial logs with metadata and pagination info",
            "initial_logs": "Initial batch data from stream endpoint",
            "heartbeat": "Connection keep-alive with open connection count",
            "log_entry": "Real-time updates as bare entries (id, user_id, query, status, timestamp, hash)"
        }
    }))
}
