//! Core error types.
//!
//! Validation failures surface through [`CoreError`] so callers can present
//! the rejection reason without inspecting opaque strings.

use thiserror::Error;

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Unified error type for Taskloom core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The command text is empty or whitespace-only.
    #[error("command cannot be empty")]
    EmptyCommand,

    /// The command exceeds the maximum accepted length.
    #[error("command too long ({length} characters, max {max})")]
    CommandTooLong { length: usize, max: usize },

    /// The command contains a deny-listed substring.
    #[error("command contains dangerous keyword: {keyword}")]
    DangerousKeyword { keyword: String },

    /// A task parameter failed shape validation.
    #[error("invalid task parameter `{field}`: {reason}")]
    InvalidParameter { field: String, reason: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
