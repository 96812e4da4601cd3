//! WebSocket 连接泵
//!
//! 每个订阅连接一个任务：注册 → (快照/初始批次) → 泵循环。
//!
//! # 顺序保证
//!
//! 进入 Open 态后实时条目开始进入本连接的有界队列，但泵循环在
//! 快照帧发出**之后**才开始取队列 — 因此"快照先于首条实时条目"
//! 即使与并发 append 竞争也成立。快照窗口与实时流可能重叠一条
//! （同一条目既在快照又在队列里），不会乱序。
//!
//! # 存活探测
//!
//! 每次心跳随帧发送一个 WebSocket Ping；任何入站帧（Pong、文本、
//! Close 之外的帧）都清零未确认计数。连续错过
//! `heartbeat_miss_limit` 个心跳周期的连接被强制断开。

use axum::extract::ws::{Message, WebSocket};

use shared::message::StreamFrame;
use shared::models::LogEntry;

use crate::core::ServerState;
use crate::hub::{Outbound, SubscriptionMode};
use crate::ledger::LogQuery;

/// 订阅连接主循环
///
/// 握手已完成（axum upgrade 回调内），这里负责连接的整个生命周期：
/// 注册、快照、实时投递、心跳转发、存活检测和收尾。
pub async fn serve_connection(
    state: ServerState,
    mut socket: WebSocket,
    user_filter: Option<String>,
    limit: usize,
    offset: usize,
    mode: SubscriptionMode,
) {
    let hub = state.hub.clone();
    let (handle, mut rx) = hub.register(user_filter.clone(), mode);
    hub.open(&handle);

    // 初始帧：快照端点发分页窗口，流端点发有界初始批次。
    // 存储层失败 → 关闭连接，绝不发出残缺快照。
    let initial = match mode {
        SubscriptionMode::SnapshotThenLive => {
            let q = LogQuery {
                user_id: user_filter.clone(),
                limit,
                offset,
                before: None,
            };
            match state.storage.list(&q).await {
                Ok(logs) => StreamFrame::LogsResponse {
                    user_filter: user_filter.clone(),
                    limit,
                    offset,
                    count: logs.len(),
                    logs,
                },
                Err(e) => {
                    tracing::error!(
                        connection_id = %handle.id,
                        error = %e,
                        "Snapshot query failed — closing subscriber"
                    );
                    hub.remove(&handle);
                    return;
                }
            }
        }
        SubscriptionMode::LiveOnly => {
            let q = LogQuery {
                user_id: user_filter.clone(),
                limit: state.config.stream_initial_limit,
                offset: 0,
                before: None,
            };
            match state.storage.list(&q).await {
                Ok(logs) => StreamFrame::InitialLogs {
                    count: logs.len(),
                    user_filter: user_filter.clone(),
                    logs,
                },
                Err(e) => {
                    tracing::error!(
                        connection_id = %handle.id,
                        error = %e,
                        "Initial batch query failed — closing subscriber"
                    );
                    hub.remove(&handle);
                    return;
                }
            }
        }
    };

    if send_frame(&mut socket, &initial).await.is_err() {
        hub.remove(&handle);
        return;
    }

    // 泵循环 — 初始帧已发出，从这里开始取实时队列
    let miss_limit = state.config.heartbeat_miss_limit;
    let mut missed_heartbeats: u32 = 0;

    loop {
        tokio::select! {
            _ = handle.cancel.cancelled() => {
                // 驱逐或停机
                break;
            }

            outbound = rx.recv() => {
                match outbound {
                    Some(Outbound::Entry(entry)) => {
                        if send_entry(&mut socket, &entry).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Heartbeat { timestamp, active_connections }) => {
                        if missed_heartbeats >= miss_limit {
                            tracing::warn!(
                                connection_id = %handle.id,
                                missed = missed_heartbeats,
                                "Subscriber unresponsive — disconnecting"
                            );
                            break;
                        }
                        missed_heartbeats += 1;

                        let frame = StreamFrame::Heartbeat { timestamp, active_connections };
                        if socket.send(Message::Ping(Vec::new().into())).await.is_err()
                            || send_frame(&mut socket, &frame).await.is_err()
                        {
                            break;
                        }
                    }
                    None => break,
                }
            }

            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {
                        // Pong 或任何客户端帧都算存活
                        missed_heartbeats = 0;
                    }
                }
            }
        }
    }

    hub.remove(&handle);
}

async fn send_frame(socket: &mut WebSocket, frame: &StreamFrame) -> Result<(), ()> {
    let text = serde_json::to_string(frame).map_err(|_| ())?;
    socket.send(Message::Text(text.into())).await.map_err(|_| ())
}

/// 实时更新按裸 LogEntry 对象发送（无 type 标签）
async fn send_entry(socket: &mut WebSocket, entry: &LogEntry) -> Result<(), ()> {
    let text = serde_json::to_string(entry).map_err(|_| ())?;
    socket.send(Message::Text(text.into())).await.map_err(|_| ())
}
