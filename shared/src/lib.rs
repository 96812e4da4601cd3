//! Shared types for the audit log service
//!
//! Common types used by the server and its clients: log entry model,
//! auth DTOs, realtime stream frames, and time/ID utilities.

pub mod client;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Wire-type re-exports (for convenient access)
pub use message::StreamFrame;
pub use models::LogEntry;
