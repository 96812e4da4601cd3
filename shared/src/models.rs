//! 数据模型
//!
//! 服务端与前端共享（通过 API）。条目一经写入不可变，
//! `hash` 为写入时对其余字段计算的 HMAC-SHA256 完整性标签。

use serde::{Deserialize, Serialize};

/// 审计日志条目（不可变）
///
/// | 字段 | 说明 |
/// |------|------|
/// | id | snowflake 风格 i64，按创建时间全序，倒序即"最新在前" |
/// | user_id | 操作主体，非空 |
/// | query | 执行的查询/操作描述，非空 |
/// | status | 结果标签（如 SUCCESS / ERROR），非空 |
/// | timestamp | 写入时固定的规范文本时间（UTC，微秒精度） |
/// | hash | HMAC-SHA256 完整性标签（小写 hex） |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub user_id: String,
    pub query: String,
    pub status: String,
    pub timestamp: String,
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_wire_shape() {
        let entry = LogEntry {
            id: 42,
            user_id: "alice".into(),
            query: "SELECT 1".into(),
            status: "SUCCESS".into(),
            timestamp: "2025-06-01T10:00:00.000000Z".into(),
            hash: "ab".repeat(32),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["user_id"], "alice");
        assert_eq!(json["hash"].as_str().unwrap().len(), 64);

        let back: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
