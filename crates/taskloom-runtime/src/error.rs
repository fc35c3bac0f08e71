//! Error types for the taskloom-runtime crate.

use thiserror::Error;

/// Alias for `Result<T, RuntimeError>`.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced by the orchestration layer.
///
/// Automation faults never appear here: the executor converts them into
/// failed [`taskloom_core::AutomationResult`]s at its boundary. What remains
/// is submission rejection and persistence failure.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A task was rejected before it entered the queue.
    #[error("task rejected: {0}")]
    Rejected(#[from] taskloom_core::CoreError),

    /// Persisting or loading task state failed.
    #[error(transparent)]
    Store(#[from] taskloom_store::StoreError),
}
