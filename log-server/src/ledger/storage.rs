//! 日志条目 SurrealDB 存储层
//!
//! Append-only 设计，没有任何删除/更新接口。公开契约里条目一经写入
//! 不可变；带外篡改由完整性标签（`ledger::integrity`）检测。
//!
//! # 排序与分页
//!
//! `entry_id` 按创建时间全序（snowflake），所有列表查询按
//! `entry_id DESC` 返回（最新在前）。分页支持两种形式：
//! - `offset` 定位 — 兼容接口，并发写入下窗口会整体漂移（弱保证）；
//! - `before` 锚点（seek）— 翻页方传上一页最后一个 id，并发写入
//!   不会造成跳过或重复。

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::models::LogEntry;

use crate::utils::{AppError, AppResult};

/// 未显式指定时的默认分页大小
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// 列表查询参数
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// 按操作主体精确过滤
    pub user_id: Option<String>,
    /// 分页大小（0 使用默认值）
    pub limit: usize,
    /// 分页偏移
    pub offset: usize,
    /// seek 锚点：只返回 `entry_id < before` 的条目
    pub before: Option<i64>,
}

/// SurrealDB 反序列化用（包含 SurrealDB record id）
#[derive(Debug, Clone, serde::Deserialize)]
struct LogRecord {
    #[allow(dead_code)]
    id: surrealdb::RecordId,
    entry_id: i64,
    user_id: String,
    query: String,
    status: String,
    timestamp: String,
    hash: String,
}

impl From<LogRecord> for LogEntry {
    fn from(r: LogRecord) -> Self {
        LogEntry {
            id: r.entry_id,
            user_id: r.user_id,
            query: r.query,
            status: r.status,
            timestamp: r.timestamp,
            hash: r.hash,
        }
    }
}

/// 插入用结构（不含 SurrealDB record id）
#[derive(Debug, serde::Serialize)]
struct LogInsert {
    entry_id: i64,
    user_id: String,
    query: String,
    status: String,
    timestamp: String,
    hash: String,
}

/// COUNT 结果
#[derive(Debug, serde::Deserialize)]
struct CountResult {
    total: u64,
}

/// 日志条目存储 (SurrealDB)
///
/// 仅提供 `insert` / `get` / `list` / `count`，没有 update/delete 接口。
#[derive(Clone)]
pub struct LogStorage {
    db: Surreal<Db>,
}

impl LogStorage {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    /// 持久化一条日志条目
    ///
    /// `entry_id` 由写入方（`LogService`）在持有 append 锁时分配，
    /// 全局索引就是 `entry_id` 排序本身，写入即入索引，二者天然原子。
    pub async fn insert(&self, entry: &LogEntry) -> AppResult<()> {
        let insert = LogInsert {
            entry_id: entry.id,
            user_id: entry.user_id.clone(),
            query: entry.query.clone(),
            status: entry.status.clone(),
            timestamp: entry.timestamp.clone(),
            hash: entry.hash.clone(),
        };

        let mut res = self
            .db
            .query("CREATE log_entry CONTENT $data")
            .bind(("data", insert))
            .await?;
        let created: Vec<LogRecord> = res.take(0)?;
        if created.is_empty() {
            return Err(AppError::database("Failed to persist log entry"));
        }

        Ok(())
    }

    /// 按条目 id 查询
    pub async fn get(&self, id: i64) -> AppResult<Option<LogEntry>> {
        let mut result = self
            .db
            .query("SELECT * FROM log_entry WHERE entry_id = $id LIMIT 1")
            .bind(("id", id))
            .await?;
        let records: Vec<LogRecord> = result.take(0)?;
        Ok(records.into_iter().next().map(LogEntry::from))
    }

    /// 列表查询，最新在前
    ///
    /// 偏移超出总数时返回空序列而不是错误。
    pub async fn list(&self, q: &LogQuery) -> AppResult<Vec<LogEntry>> {
        let limit = if q.limit == 0 { DEFAULT_PAGE_LIMIT } else { q.limit };

        let mut conditions = Vec::new();
        if q.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        if q.before.is_some() {
            conditions.push("entry_id < $before");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM log_entry{} ORDER BY entry_id DESC LIMIT {} START {}",
            where_clause, limit, q.offset
        );

        let mut qb = self.db.query(&sql);
        if let Some(ref user_id) = q.user_id {
            qb = qb.bind(("user_id", user_id.clone()));
        }
        if let Some(before) = q.before {
            qb = qb.bind(("before", before));
        }

        let mut result = qb.await?;
        let records: Vec<LogRecord> = result.take(0)?;
        Ok(records.into_iter().map(LogEntry::from).collect())
    }

    /// 条目总数（可选按用户过滤）
    pub async fn count(&self, user_id: Option<&str>) -> AppResult<u64> {
        let sql = if user_id.is_some() {
            "SELECT count() AS total FROM log_entry WHERE user_id = $user_id GROUP ALL"
        } else {
            "SELECT count() AS total FROM log_entry GROUP ALL"
        };

        let mut qb = self.db.query(sql);
        if let Some(u) = user_id {
            qb = qb.bind(("user_id", u.to_string()));
        }

        let mut result = qb.await?;
        let counts: Vec<CountResult> = result.take(0)?;
        Ok(counts.first().map(|c| c.total).unwrap_or(0))
    }
}
