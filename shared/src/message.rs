//! 实时流帧类型定义
//!
//! 这些类型在 log-server 和订阅客户端之间共享。WebSocket 连接上
//! 除了裸 [`LogEntry`](crate::models::LogEntry) 实时更新外，还会出现
//! 以下带 `type` 标签的帧。

use serde::{Deserialize, Serialize};

use crate::models::LogEntry;

/// 带标签的流帧
///
/// | `type` | 说明 |
/// |--------|------|
/// | `logs_response` | 快照端点的首帧：分页窗口 + 元数据 |
/// | `initial_logs` | 流端点的可选首帧：有界初始批次 |
/// | `heartbeat` | 周期心跳：时间戳 + 当前打开连接数 |
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    LogsResponse {
        user_filter: Option<String>,
        limit: usize,
        offset: usize,
        count: usize,
        logs: Vec<LogEntry>,
    },
    InitialLogs {
        count: usize,
        user_filter: Option<String>,
        logs: Vec<LogEntry>,
    },
    Heartbeat {
        timestamp: String,
        active_connections: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_tags() {
        let hb = StreamFrame::Heartbeat {
            timestamp: "2025-06-01T10:00:00.000000Z".into(),
            active_connections: 3,
        };
        let json = serde_json::to_value(&hb).unwrap();
        assert_eq!(json["type"], "heartbeat");
        assert_eq!(json["active_connections"], 3);

        let snap = StreamFrame::LogsResponse {
            user_filter: None,
            limit: 100,
            offset: 0,
            count: 0,
            logs: vec![],
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["type"], "logs_response");
        assert!(json["user_filter"].is_null());
    }
}
