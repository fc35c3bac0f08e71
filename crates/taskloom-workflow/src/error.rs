//! Workflow error types.

use thiserror::Error;
use uuid::Uuid;

/// Convenience alias used throughout the workflow crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Unified error type for the workflow engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The referenced workflow does not exist.
    #[error("workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: Uuid },

    /// A node raised a fault during execution.
    #[error("node `{node_id}` ({node_type}) failed: {reason}")]
    NodeFailed {
        node_id: String,
        node_type: String,
        reason: String,
    },

    /// An integration adapter rejected its input.
    #[error("invalid node input: {0}")]
    InvalidInput(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
