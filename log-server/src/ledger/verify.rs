//! 按需完整性校验
//!
//! 从存储取出条目，用写入时同一套规范化和密钥重算标签，常数时间
//! 比较。不匹配是**正常返回值**（`valid: false`）— 它正是篡改检测
//! 要给出的信号；只有条目不存在或存储故障才是错误。

use std::sync::Arc;

use shared::client::Verification;

use crate::ledger::integrity::IntegrityKey;
use crate::ledger::storage::LogStorage;
use crate::utils::{AppError, AppResult};

/// 完整性校验服务
pub struct IntegrityVerifier {
    storage: LogStorage,
    key: Arc<IntegrityKey>,
}

impl IntegrityVerifier {
    pub fn new(storage: LogStorage, key: Arc<IntegrityKey>) -> Self {
        Self { storage, key }
    }

    /// 校验指定条目
    ///
    /// - 条目不存在 → `NotFound` 错误（调用方能区分"不存在"和"验不过"）
    /// - 标签匹配 → `valid: true` + 验证令牌
    /// - 标签不匹配 → `valid: false` + 诊断信息，不是错误
    pub async fn verify(&self, id: i64) -> AppResult<Verification> {
        let entry = self
            .storage
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Log entry {} not found", id)))?;

        let valid = self.key.verify_tag(
            &entry.user_id,
            &entry.query,
            &entry.status,
            &entry.timestamp,
            &entry.hash,
        );

        if valid {
            Ok(Verification {
                valid: true,
                verification_token: Some(self.key.verification_token(entry.id, &entry.hash)),
                error: None,
            })
        } else {
            tracing::warn!(entry_id = id, "Integrity tag mismatch — entry may have been tampered with");
            Ok(Verification {
                valid: false,
                verification_token: None,
                error: Some(
                    "Hash verification failed - log may have been tampered with".to_string(),
                ),
            })
        }
    }
}
