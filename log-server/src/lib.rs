//! Audit Log Server - 聊天式数据库助手的防篡改审计日志服务
//!
//! # 架构概述
//!
//! 本模块是审计日志服务的主入口，提供以下核心功能：
//!
//! - **会话** (`session`): 不透明 bearer 令牌的签发与校验
//! - **日志账本** (`ledger`): append-only 存储 + HMAC-SHA256 完整性标签
//! - **实时推送** (`hub`): 订阅注册表、扇出、心跳、背压驱逐
//! - **HTTP API** (`api`): RESTful + WebSocket 接口
//!
//! # 模块结构
//!
//! ```text
//! log-server/src/
//! ├── core/          # 配置、状态、生命周期
//! ├── session/       # 会话令牌
//! ├── ledger/        # 存储、写入、完整性
//! ├── hub/           # 实时推送中心
//! ├── api/           # HTTP/WS 路由和处理器
//! ├── db/            # 数据库层
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod hub;
pub mod ledger;
pub mod session;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use hub::{RealtimeHub, SubscriptionMode};
pub use ledger::{IntegrityKey, IntegrityVerifier, LogService, LogStorage};
pub use session::{CurrentUser, SessionManager};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    init_logger();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __
   / /   ___  ____ _____ ____  _____
  / /   / _ \/ __ `/ __ `/ _ \/ ___/
 / /___/  __/ /_/ / /_/ /  __/ /
/_____/\___/\__,_/\__, /\___/_/
                 /____/
    "#
    );
}
