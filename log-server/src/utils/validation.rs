//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Every write-path field is required to be non-empty; an entry with an
//! empty `user_id`, `query` or `status` would produce a meaningless
//! integrity tag, so these are rejected before anything is hashed.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Acting principal identifiers
pub const MAX_USER_ID_LEN: usize = 100;

/// Free-text query / SQL statements
pub const MAX_QUERY_LEN: usize = 8192;

/// Outcome tags (SUCCESS, ERROR, …)
pub const MAX_STATUS_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert!(validate_required_text("", "user_id", MAX_USER_ID_LEN).is_err());
        assert!(validate_required_text("   ", "user_id", MAX_USER_ID_LEN).is_err());
        assert!(validate_required_text("alice", "user_id", MAX_USER_ID_LEN).is_ok());
    }

    #[test]
    fn test_over_limit_rejected() {
        let long = "x".repeat(MAX_STATUS_LEN + 1);
        assert!(validate_required_text(&long, "status", MAX_STATUS_LEN).is_err());
    }
}
