//! Bearer token extractor
//!
//! Custom extractor that validates the `Authorization: Bearer <token>`
//! header against the session manager and injects [`CurrentUser`] into
//! protected handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::core::ServerState;
use crate::security_log;

/// 当前用户上下文 (从会话令牌解析)
///
/// # 示例
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> Json<()> {
///     println!("用户: {}", user.user_id);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// 用户 ID
    pub user_id: String,
    /// 本次请求携带的令牌（logout 用）
    pub token: String,
}

/// 从 Authorization 头提取令牌
pub fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (handler composition)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => extract_bearer(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::unauthorized());
            }
        };

        match state.sessions.validate(token) {
            Ok(user_id) => {
                let user = CurrentUser {
                    user_id,
                    token: token.to_string(),
                };

                // Store in extensions for potential reuse
                parts.extensions.insert(user.clone());

                Ok(user)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = format!("{}", e),
                    uri = format!("{:?}", parts.uri)
                );
                Err(e)
            }
        }
    }
}
