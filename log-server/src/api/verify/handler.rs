//! Verify API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::client::VerifyResponse;

use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/v1/verify/{log_id} - 校验指定条目的完整性
///
/// 404 = 条目不存在；`valid: false` = 条目存在但验不过（被篡改）。
/// 调用方必须能区分这两种情况。
pub async fn verify(
    State(state): State<ServerState>,
    Path(log_id): Path<i64>,
) -> AppResult<Json<VerifyResponse>> {
    let verification = state.verifier.verify(log_id).await?;

    Ok(Json(VerifyResponse {
        log_id,
        verification,
    }))
}
