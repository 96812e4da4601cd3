//! 实时推送中心 — 连接注册表、扇出、心跳与背压
//!
//! # 架构
//!
//! ```text
//! LogService::append (持久化成功后)
//!   └─ RealtimeHub::publish(entry)
//!        └─ 遍历注册表，过滤匹配 → try_send 到各连接的有界队列
//!             ├─ 入队成功 → 连接任务异步投递
//!             └─ 队列满 → 驱逐该连接（Closing → Closed），写路径不受影响
//!
//! 心跳定时器（独立于日志流量）
//!   └─ broadcast_heartbeat → 同样的入队或驱逐策略
//! ```
//!
//! # 并发纪律
//!
//! 注册表是唯一被 connect/disconnect 与 publish 并发触碰的状态，
//! 统一走 DashMap；遍历期间不做删除，先收集待驱逐 id 再移除，
//! 避免迭代与删除在同一分片上互锁。
//!
//! # 投递保证
//!
//! - 单连接内投递顺序 = 发布顺序（单 mpsc 队列，无重排）
//! - at-most-once：断连期间错过的条目不回放
//! - 快照先于首条实时条目（见 [`socket`] 的泵循环）

pub mod connection;
pub mod socket;

pub use connection::{ConnectionHandle, ConnectionState, Outbound, SubscriptionMode};

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use shared::models::LogEntry;
use shared::util::canonical_timestamp;

/// 实时推送中心
///
/// 持有全部打开连接的注册表。只借条目的引用做克隆投递，
/// 从不拥有日志数据本身。
pub struct RealtimeHub {
    connections: DashMap<Uuid, Arc<ConnectionHandle>>,
    /// 每连接出站队列容量
    queue_size: usize,
    /// 心跳间隔
    heartbeat_interval: Duration,
}

impl RealtimeHub {
    pub fn new(queue_size: usize, heartbeat_interval: Duration) -> Self {
        Self {
            connections: DashMap::new(),
            queue_size,
            heartbeat_interval,
        }
    }

    /// 注册一个新连接（Connecting 态），返回句柄和队列接收端
    pub fn register(
        &self,
        user_filter: Option<String>,
        mode: SubscriptionMode,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(self.queue_size);
        let handle = Arc::new(ConnectionHandle::new(user_filter, mode, tx));
        self.connections.insert(handle.id, handle.clone());
        tracing::debug!(connection_id = %handle.id, "Subscriber registered");
        (handle, rx)
    }

    /// 握手完成，连接进入 Open 态，开始接收投递
    pub fn open(&self, handle: &ConnectionHandle) {
        handle.advance_state(ConnectionState::Open);
        tracing::info!(
            connection_id = %handle.id,
            user_filter = ?handle.user_filter,
            mode = ?handle.mode,
            "Subscriber connection open"
        );
    }

    /// 关闭并移除连接（幂等）
    ///
    /// 取消令牌让连接任务立即退出；移除后任何 publish 都不再触达它。
    pub fn remove(&self, handle: &ConnectionHandle) {
        handle.advance_state(ConnectionState::Closed);
        handle.cancel.cancel();
        if self.connections.remove(&handle.id).is_some() {
            tracing::info!(connection_id = %handle.id, "Subscriber connection closed");
        }
    }

    /// 当前 Open 态连接数（跨两种端点）
    pub fn active_connections(&self) -> usize {
        self.connections.iter().filter(|c| c.is_open()).count()
    }

    /// 向所有过滤匹配的 Open 连接扇出一条新条目
    ///
    /// 非阻塞：入队失败（队列满/接收端没了）即驱逐该连接，
    /// 绝不让慢订阅者拖慢 `append` 或其他订阅者。
    pub fn publish(&self, entry: &LogEntry) {
        let mut evicted = Vec::new();

        for conn in self.connections.iter() {
            if !conn.is_open() || !conn.matches(&entry.user_id) {
                continue;
            }
            if conn.try_enqueue(Outbound::Entry(entry.clone())).is_err() {
                conn.advance_state(ConnectionState::Closing);
                evicted.push(conn.value().clone());
            }
        }

        for conn in evicted {
            tracing::warn!(
                connection_id = %conn.id,
                "Subscriber queue full — evicting slow consumer"
            );
            self.remove(&conn);
        }
    }

    /// 向所有 Open 连接广播一次心跳
    ///
    /// `active_connections` 在广播前采样一次，所有连接看到同一个数。
    pub fn broadcast_heartbeat(&self) {
        let active = self.active_connections();
        let timestamp = canonical_timestamp();
        let mut evicted = Vec::new();

        for conn in self.connections.iter() {
            if !conn.is_open() {
                continue;
            }
            let beat = Outbound::Heartbeat {
                timestamp: timestamp.clone(),
                active_connections: active,
            };
            if conn.try_enqueue(beat).is_err() {
                conn.advance_state(ConnectionState::Closing);
                evicted.push(conn.value().clone());
            }
        }

        for conn in evicted {
            tracing::warn!(
                connection_id = %conn.id,
                "Subscriber queue full at heartbeat — evicting"
            );
            self.remove(&conn);
        }
    }

    /// 心跳定时任务（注册为 Periodic 后台任务）
    pub async fn run_heartbeat(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.heartbeat_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 第一个 tick 立即到期，跳过它，让心跳从一个完整间隔后开始
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Heartbeat task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.broadcast_heartbeat();
                }
            }
        }
    }

    /// 关闭所有连接（服务器停机时调用）
    pub fn close_all(&self) {
        let handles: Vec<_> = self.connections.iter().map(|c| c.value().clone()).collect();
        for handle in handles {
            self.remove(&handle);
        }
    }
}
