//! 会话令牌服务
//!
//! 为写入/校验 API 签发短期不透明 bearer 令牌。令牌是 32 字节
//! 密码学随机数的 URL-safe base64，服务端持有会话记录，不含任何
//! 可解析内容。
//!
//! # 失效语义
//!
//! 逻辑失效优先于物理删除：`validate` 每次都重查 `expires_at`，
//! 过期即拒绝 — 即使清理任务还没来得及删除记录。`revoke` 无条件
//! 删除且幂等。

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};

use shared::util::now_millis;

use crate::utils::{AppError, AppResult};

/// 会话记录
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    /// Unix 毫秒
    pub issued_at: i64,
    /// Unix 毫秒，严格大于 issued_at
    pub expires_at: i64,
}

/// 会话管理器 — 独占持有全部会话记录
pub struct SessionManager {
    sessions: DashMap<String, Session>,
    ttl_minutes: i64,
    rng: SystemRandom,
}

impl SessionManager {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_minutes,
            rng: SystemRandom::new(),
        }
    }

    /// 签发新会话，返回会话记录（含令牌）
    pub fn issue(&self, user_id: &str) -> AppResult<Session> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::internal("Failed to generate session token"))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let issued_at = now_millis();
        let session = Session {
            token: token.clone(),
            user_id: user_id.to_string(),
            issued_at,
            expires_at: issued_at + self.ttl_minutes * 60_000,
        };

        self.sessions.insert(token, session.clone());
        tracing::debug!(user_id = %user_id, "Session issued");
        Ok(session)
    }

    /// 校验令牌，返回所属 user_id
    ///
    /// 令牌未知或已过期 → 401。没有任何"部分有效"状态。
    pub fn validate(&self, token: &str) -> AppResult<String> {
        {
            let Some(session) = self.sessions.get(token) else {
                return Err(AppError::invalid_token("Unknown session token"));
            };
            if now_millis() < session.expires_at {
                return Ok(session.user_id.clone());
            }
        }
        // 过期记录顺手回收（guard 已释放，避免 DashMap 自锁）
        self.sessions.remove(token);
        Err(AppError::token_expired())
    }

    /// 吊销令牌 — 无条件删除，幂等
    pub fn revoke(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// 清理已过期的会话记录，返回回收数量
    ///
    /// 只是回收内存；正确性由 `validate` 的逻辑失效保证。
    pub fn sweep_expired(&self) -> usize {
        let before = self.sessions.len();
        let now = now_millis();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    /// 当前存活会话数
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let mgr = SessionManager::new(30);
        let session = mgr.issue("alice").unwrap();
        assert!(session.expires_at > session.issued_at);
        assert_eq!(mgr.validate(&session.token).unwrap(), "alice");
    }

    #[test]
    fn test_tokens_are_unique_and_opaque() {
        let mgr = SessionManager::new(30);
        let a = mgr.issue("alice").unwrap();
        let b = mgr.issue("alice").unwrap();
        assert_ne!(a.token, b.token);
        // 32 bytes → 43 chars of unpadded base64
        assert_eq!(a.token.len(), 43);
        assert!(!a.token.contains("alice"));
    }

    #[test]
    fn test_unknown_token_rejected() {
        let mgr = SessionManager::new(30);
        assert!(matches!(
            mgr.validate("no-such-token"),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected_even_before_sweep() {
        let mgr = SessionManager::new(0); // expires immediately
        let session = mgr.issue("alice").unwrap();
        // 逻辑失效：记录还在表里，但 validate 必须拒绝
        assert!(matches!(
            mgr.validate(&session.token),
            Err(AppError::TokenExpired)
        ));
        // 第二次校验（记录已被顺手删除）也不能通过
        assert!(mgr.validate(&session.token).is_err());
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let mgr = SessionManager::new(30);
        let session = mgr.issue("alice").unwrap();
        mgr.revoke(&session.token);
        mgr.revoke(&session.token); // not an error
        assert!(mgr.validate(&session.token).is_err());
    }

    #[test]
    fn test_sweep_reclaims_only_expired() {
        let mgr = SessionManager::new(0);
        mgr.issue("a").unwrap();
        mgr.issue("b").unwrap();
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.sweep_expired(), 2);
        assert!(mgr.is_empty());

        let live = SessionManager::new(30);
        live.issue("c").unwrap();
        assert_eq!(live.sweep_expired(), 0);
        assert_eq!(live.len(), 1);
    }
}
