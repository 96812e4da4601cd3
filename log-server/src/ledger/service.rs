//! 日志写入服务
//!
//! `LogService::append` 是唯一的写入口：校验 → 时间戳 → 分配 id →
//! 计算完整性标签 → 持久化 → 发布给订阅者。
//!
//! # append 锁
//!
//! id 分配、持久化、发布三步在一把异步锁内完成，保证
//! id 顺序 == 存储顺序 == 发布顺序。锁内没有慢路径：
//! 发布是非阻塞 try_send，慢订阅者被驱逐而不是拖住写入。
//!
//! # 失败语义
//!
//! 持久化失败 → 调用方收到错误，**不发布**（订阅者看到的每条
//! 都已落库）。发布侧的失败只影响对应订阅者，永不影响 append。

use std::sync::Arc;

use shared::models::LogEntry;
use shared::util::{EntryIdSequence, canonical_timestamp};

use crate::hub::RealtimeHub;
use crate::ledger::integrity::IntegrityKey;
use crate::ledger::storage::LogStorage;
use crate::utils::validation::{
    MAX_QUERY_LEN, MAX_STATUS_LEN, MAX_USER_ID_LEN, validate_required_text,
};
use crate::utils::AppResult;

/// 日志写入服务
pub struct LogService {
    storage: LogStorage,
    hub: Arc<RealtimeHub>,
    key: Arc<IntegrityKey>,
    ids: EntryIdSequence,
    /// 序列化 id 分配 + 持久化 + 发布，防止条目乱序
    append_lock: tokio::sync::Mutex<()>,
}

impl LogService {
    pub fn new(storage: LogStorage, hub: Arc<RealtimeHub>, key: Arc<IntegrityKey>) -> Self {
        Self {
            storage,
            hub,
            key,
            ids: EntryIdSequence::new(),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// 追加一条日志条目
    ///
    /// 返回持久化后的完整条目（含 id、时间戳和完整性标签）。
    pub async fn append(&self, user_id: &str, query: &str, status: &str) -> AppResult<LogEntry> {
        validate_required_text(user_id, "user_id", MAX_USER_ID_LEN)?;
        validate_required_text(query, "query", MAX_QUERY_LEN)?;
        validate_required_text(status, "status", MAX_STATUS_LEN)?;

        let _guard = self.append_lock.lock().await;

        let timestamp = canonical_timestamp();
        let id = self.ids.next();
        let hash = self.key.tag(user_id, query, status, &timestamp);

        let entry = LogEntry {
            id,
            user_id: user_id.to_string(),
            query: query.to_string(),
            status: status.to_string(),
            timestamp,
            hash,
        };

        // 先落库；失败则不发布
        self.storage.insert(&entry).await?;

        tracing::debug!(
            entry_id = entry.id,
            user_id = %entry.user_id,
            status = %entry.status,
            "Log entry recorded"
        );

        // 尽力而为的扇出 — 永不阻塞、永不使 append 失败
        self.hub.publish(&entry);

        Ok(entry)
    }
}
