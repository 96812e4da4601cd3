//! Authentication Handlers
//!
//! Handles session issuance and revocation

use axum::{Json, extract::State};

use shared::client::{LoginRequest, TokenResponse};

use crate::AppError;
use crate::core::ServerState;
use crate::security_log;
use crate::session::CurrentUser;
use crate::utils::validation::{MAX_USER_ID_LEN, validate_required_text};

/// Login handler
///
/// Issues a short-lived opaque bearer token for the given principal.
/// 周边产品的 RBAC 后端负责身份判定，这里只做会话签发。
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_required_text(&req.user_id, "user_id", MAX_USER_ID_LEN)?;

    let session = state.sessions.issue(&req.user_id)?;

    security_log!("INFO", "session_issued", user_id = req.user_id.clone());
    tracing::info!(user_id = %req.user_id, "Session token issued");

    Ok(Json(TokenResponse::bearer(session.token)))
}

/// Logout handler — revokes the presented token (idempotent)
pub async fn logout(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> Result<Json<()>, AppError> {
    state.sessions.revoke(&user.token);

    tracing::info!(user_id = %user.user_id, "Session revoked");

    Ok(Json(()))
}
