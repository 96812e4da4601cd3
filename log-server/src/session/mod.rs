//! 会话模块
//!
//! 提供不透明 bearer 令牌的签发、校验与吊销：
//! - [`SessionManager`] - 会话令牌服务
//! - [`CurrentUser`] - 当前用户上下文（extractor 注入）

pub mod extractor;
pub mod manager;

pub use extractor::CurrentUser;
pub use manager::{Session, SessionManager};
