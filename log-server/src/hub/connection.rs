//! 订阅连接句柄
//!
//! 每个 WebSocket 订阅者对应一个 [`ConnectionHandle`]，由
//! [`RealtimeHub`](super::RealtimeHub) 的注册表持有。句柄只携带投递
//! 所需的最小状态：过滤器、有界出站队列的发送端、取消令牌和
//! 连接状态机。

use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use shared::models::LogEntry;

/// 连接状态机
///
/// Connecting → Open → Closing → Closed，只许向前。
/// Open 之前不投递任何消息，Closed 之后不再被任何 publish 触达。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// 握手进行中
    Connecting = 0,
    /// 可接收快照/实时数据和心跳
    Open = 1,
    /// 断开请求或队列饱和，等待任务退出
    Closing = 2,
    /// 已从所有注册表移除
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// 订阅模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    /// 先投递一次分页快照，再进入实时转发
    SnapshotThenLive,
    /// 可选的有界初始批次后，只转发此后发布的条目
    LiveOnly,
}

/// 出站消息 — 实时条目或心跳
#[derive(Debug, Clone)]
pub enum Outbound {
    Entry(LogEntry),
    Heartbeat {
        timestamp: String,
        active_connections: usize,
    },
}

/// 订阅连接句柄
pub struct ConnectionHandle {
    pub id: Uuid,
    /// 精确匹配过滤器，None 表示全量订阅
    pub user_filter: Option<String>,
    pub mode: SubscriptionMode,
    /// 有界出站队列发送端（满即驱逐）
    tx: mpsc::Sender<Outbound>,
    /// 取消令牌 — 驱逐/关闭时通知连接任务退出
    pub cancel: CancellationToken,
    state: AtomicU8,
}

impl ConnectionHandle {
    pub fn new(
        user_filter: Option<String>,
        mode: SubscriptionMode,
        tx: mpsc::Sender<Outbound>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_filter,
            mode,
            tx,
            cancel: CancellationToken::new(),
            state: AtomicU8::new(ConnectionState::Connecting as u8),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 状态只能前进，不能回退
    pub fn advance_state(&self, next: ConnectionState) {
        self.state.fetch_max(next as u8, Ordering::AcqRel);
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// 过滤器匹配：未设置即全匹配，设置则精确匹配
    pub fn matches(&self, user_id: &str) -> bool {
        match &self.user_filter {
            None => true,
            Some(filter) => filter == user_id,
        }
    }

    /// 非阻塞入队
    ///
    /// 队列满或接收端已丢弃都返回 Err — 调用方（hub）据此驱逐，
    /// 绝不等待，慢消费者不能拖住别人。
    pub fn try_enqueue(&self, msg: Outbound) -> Result<(), ()> {
        self.tx.try_send(msg).map_err(|_| ())
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("user_filter", &self.user_filter)
            .field("mode", &self.mode)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
