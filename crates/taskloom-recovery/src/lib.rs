//! # taskloom-recovery
//!
//! Tiered error classification and recovery for the Taskloom platform.
//!
//! Faults are classified into a (category, severity) pair by ordered
//! keyword matching on the fault message, recorded as [`ErrorContext`]
//! entries in an append-only history, and — where a [`RecoveryStrategy`]
//! is registered for the category — recovered automatically via retry with
//! exponential backoff or a fallback operation.
//!
//! ## Modules
//!
//! - [`classify`] — the ordered keyword decision list.
//! - [`context`] — [`ErrorContext`], [`ErrorCategory`], [`ErrorSeverity`].
//! - [`strategy`] — [`Operation`], [`RecoveryStrategy`], retry and fallback.
//! - [`handler`] — [`ErrorHandler`] and aggregate statistics.

pub mod classify;
pub mod context;
pub mod handler;
pub mod strategy;

// ── re-exports ───────────────────────────────────────────────────────

pub use classify::classify;
pub use context::{ErrorCategory, ErrorContext, ErrorSeverity};
pub use handler::{ErrorHandler, ErrorStatistics};
pub use strategy::{BoxError, FallbackStrategy, Operation, RecoveryStrategy, RetryStrategy};
