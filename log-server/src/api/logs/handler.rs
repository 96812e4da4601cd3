//! Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use shared::client::{LogCreate, LogListResponse};
use shared::models::LogEntry;

use crate::core::ServerState;
use crate::ledger::LogQuery;
use crate::session::CurrentUser;
use crate::utils::AppResult;

/// PUT /api/v1/logs - 追加一条日志条目
///
/// `user_id` 取自会话令牌，不信任请求体。
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<LogCreate>,
) -> AppResult<Json<LogEntry>> {
    let entry = state
        .logs
        .append(&user.user_id, &payload.query, &payload.status)
        .await?;

    Ok(Json(entry))
}

/// 列表查询参数
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// 按操作主体过滤
    pub user_id: Option<String>,
    /// 分页大小（缺省用配置默认值）
    pub limit: Option<usize>,
    /// 分页偏移
    #[serde(default)]
    pub offset: usize,
    /// seek 锚点：上一页最后一个 id（并发写入下无跳过/重复）
    pub before: Option<i64>,
}

/// GET /api/v1/logs - 列表查询，最新在前
pub async fn list(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<LogListResponse>> {
    let q = LogQuery {
        user_id: params.user_id,
        limit: params.limit.unwrap_or(state.config.default_page_limit),
        offset: params.offset,
        before: params.before,
    };

    let logs = state.storage.list(&q).await?;

    Ok(Json(LogListResponse {
        count: logs.len(),
        logs,
    }))
}
