use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;
use crate::hub::RealtimeHub;
use crate::ledger::{IntegrityKey, IntegrityVerifier, LogService, LogStorage};
use crate::session::SessionManager;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是审计日志服务的核心数据结构，持有所有服务的共享
/// 引用。使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | sessions | Arc<SessionManager> | 会话令牌服务 |
/// | storage | LogStorage | 日志条目存储 |
/// | logs | Arc<LogService> | 日志写入服务 |
/// | verifier | Arc<IntegrityVerifier> | 完整性校验服务 |
/// | hub | Arc<RealtimeHub> | 实时推送中心 |
///
/// # 使用示例
///
/// ```ignore
/// let entry = state.logs.append("alice", "SELECT 1", "SUCCESS").await?;
/// let verification = state.verifier.verify(entry.id).await?;
/// ```
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 会话令牌服务
    pub sessions: Arc<SessionManager>,
    /// 日志条目存储
    pub storage: LogStorage,
    /// 日志写入服务
    pub logs: Arc<LogService>,
    /// 完整性校验服务
    pub verifier: Arc<IntegrityVerifier>,
    /// 实时推送中心
    pub hub: Arc<RealtimeHub>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/logs.db)
    /// 3. 各服务 (IntegrityKey, Hub, Storage, Writer, Verifier, Sessions)
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 0. Ensure work_dir structure exists
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Initialize DB
        let db_path = config.database_dir().join("logs.db");
        let db_path_str = db_path.to_string_lossy();

        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");
        let db = db_service.db;

        // 2. Initialize Services
        let key = Arc::new(IntegrityKey::new(config.secret_key.as_bytes()));
        let hub = Arc::new(RealtimeHub::new(
            config.connection_queue_size,
            Duration::from_secs(config.heartbeat_interval_secs),
        ));
        let storage = LogStorage::new(db.clone());
        let logs = Arc::new(LogService::new(storage.clone(), hub.clone(), key.clone()));
        let verifier = Arc::new(IntegrityVerifier::new(storage.clone(), key));
        let sessions = Arc::new(SessionManager::new(config.session_ttl_minutes));

        Self {
            config: config.clone(),
            db,
            sessions,
            storage,
            logs,
            verifier,
            hub,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 心跳广播 (Periodic)
    /// - 过期会话清理 (Periodic)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let hub = self.hub.clone();
        let shutdown = tasks.shutdown_token();
        tasks.spawn("heartbeat", TaskKind::Periodic, async move {
            hub.run_heartbeat(shutdown).await;
        });

        let sessions = self.sessions.clone();
        let shutdown = tasks.shutdown_token();
        tasks.spawn("session_sweeper", TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let swept = sessions.sweep_expired();
                        if swept > 0 {
                            tracing::debug!(swept, "Expired sessions reclaimed");
                        }
                    }
                }
            }
        });

        tasks
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
