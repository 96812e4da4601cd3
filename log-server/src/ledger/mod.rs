//! 审计日志核心模块 — 防篡改的 append-only 日志
//!
//! # 架构
//!
//! ```text
//! PUT /api/v1/logs
//!   └─ LogService::append
//!        ├─ 校验 (非空/长度)
//!        ├─ canonical_timestamp + snowflake id
//!        ├─ IntegrityKey::tag (HMAC-SHA256, 长度前缀规范化)
//!        ├─ LogStorage::insert (SurrealDB, append-only)
//!        └─ RealtimeHub::publish (非阻塞扇出)
//!
//! GET /api/v1/verify/{id}
//!   └─ IntegrityVerifier::verify → { valid, verification_token, error }
//! ```
//!
//! # 防篡改保证
//!
//! - **HMAC-SHA256 标签**: 密钥注入配置，带外改动任一字段即验不过
//! - **单射规范化**: 长度前缀编码，字段边界无歧义
//! - **Append-only**: 公开契约无删除/更新接口

pub mod integrity;
pub mod service;
pub mod storage;
pub mod verify;

pub use integrity::IntegrityKey;
pub use service::LogService;
pub use storage::{DEFAULT_PAGE_LIMIT, LogQuery, LogStorage};
pub use verify::IntegrityVerifier;
