//! Client-related types shared between server and client
//!
//! Common request/response types used in API communication.

use serde::{Deserialize, Serialize};

use crate::models::LogEntry;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
}

/// Login response — opaque bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// =============================================================================
// Log API DTOs
// =============================================================================

/// Log creation request (`PUT /api/v1/logs`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogCreate {
    pub query: String,
    pub status: String,
}

/// Log listing response (`GET /api/v1/logs`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogListResponse {
    pub count: usize,
    pub logs: Vec<LogEntry>,
}

// =============================================================================
// Verify API DTOs
// =============================================================================

/// Verification outcome — a mismatch is data, not an error.
///
/// `verification_token` is only issued for valid entries; `error` carries
/// the diagnostic when the stored tag does not match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Verify response (`GET /api/v1/verify/{log_id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub log_id: i64,
    pub verification: Verification,
}
