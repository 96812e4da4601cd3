use std::path::PathBuf;

use ring::rand::{SecureRandom, SystemRandom};

/// 服务器配置 - 审计日志服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/log-server | 工作目录（数据库、日志） |
/// | HTTP_PORT | 8001 | HTTP/WS 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_SECRET_KEY | (见下) | 完整性标签 HMAC 密钥 |
/// | SESSION_TTL_MINUTES | 30 | 会话令牌有效期（分钟） |
/// | HEARTBEAT_INTERVAL_SECS | 30 | 心跳间隔（秒） |
/// | HEARTBEAT_MISS_LIMIT | 3 | 连续错过心跳次数上限 |
/// | CONNECTION_QUEUE_SIZE | 256 | 每连接出站队列容量 |
/// | DEFAULT_PAGE_LIMIT | 100 | 列表/快照默认分页大小 |
/// | STREAM_INITIAL_LIMIT | 50 | 流端点初始批次大小 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/logs HTTP_PORT=8001 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API / WebSocket 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 完整性标签密钥（注入配置，可轮换，不进二进制）
    pub secret_key: String,
    /// 会话令牌有效期（分钟）
    pub session_ttl_minutes: i64,
    /// 心跳间隔（秒）
    pub heartbeat_interval_secs: u64,
    /// 连续错过心跳次数上限，超过即强制断开
    pub heartbeat_miss_limit: u32,
    /// 每连接出站队列容量（满即驱逐，保护写路径）
    pub connection_queue_size: usize,
    /// 列表/快照默认分页大小
    pub default_page_limit: usize,
    /// 流端点初始批次大小
    pub stream_initial_limit: usize,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/log-server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8001),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            secret_key: load_secret_key(),
            session_ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            heartbeat_interval_secs: std::env::var("HEARTBEAT_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            heartbeat_miss_limit: std::env::var("HEARTBEAT_MISS_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            connection_queue_size: std::env::var("CONNECTION_QUEUE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(256),
            default_page_limit: std::env::var("DEFAULT_PAGE_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
            stream_initial_limit: std::env::var("STREAM_INITIAL_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(50),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(PathBuf::from(&self.work_dir).join("logs"))?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 从环境变量安全地加载完整性标签密钥
///
/// 开发构建允许缺省（生成临时密钥并告警），发布构建必须显式配置，
/// 否则换一次密钥历史条目就全部验不过。
fn load_secret_key() -> String {
    match std::env::var("LOG_SECRET_KEY") {
        Ok(secret) if secret.len() >= 32 => secret,
        Ok(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!(
                    "⚠️  LOG_SECRET_KEY shorter than 32 bytes! Generating temporary key."
                );
                generate_printable_secret()
            }
            #[cfg(not(debug_assertions))]
            {
                panic!("🚨 FATAL: LOG_SECRET_KEY must be at least 32 characters long");
            }
        }
        Err(_) => {
            #[cfg(debug_assertions)]
            {
                tracing::warn!(
                    "⚠️  LOG_SECRET_KEY not set! Generating secure temporary key for development."
                );
                generate_printable_secret()
            }
            #[cfg(not(debug_assertions))]
            {
                panic!("🚨 FATAL: LOG_SECRET_KEY environment variable must be set in production!");
            }
        }
    }
}

/// 生成可打印的临时密钥（仅开发环境）
fn generate_printable_secret() -> String {
    let allowed_chars =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

    let rng = SystemRandom::new();
    let mut key = String::new();

    for _ in 0..64 {
        let mut byte = [0u8; 1];
        if rng.fill(&mut byte).is_err() {
            // 随机数生成失败时退回固定开发密钥
            return "LogServerDevelopmentOnlySecretKey2025!".to_string();
        }
        let idx = (byte[0] as usize) % allowed_chars.len();
        key.push(allowed_chars.as_bytes()[idx] as char);
    }

    key
}
