//! Authentication Routes

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Build authentication router
/// - /api/v1/login: public (no auth required)
/// - /api/v1/logout: requires a valid bearer token
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/v1/login", post(handler::login))
        .route("/api/v1/logout", post(handler::logout))
}
