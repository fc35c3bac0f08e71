//! # taskloom-core
//!
//! Shared data model for the Taskloom automation platform: task lifecycle
//! types, the intent-extraction contract, and input validation.
//!
//! ## Modules
//!
//! - [`task`] — [`Task`], [`TaskType`], [`TaskStatus`], [`AutomationResult`].
//! - [`intent`] — the [`IntentExtractor`] seam and the built-in keyword
//!   extractor.
//! - [`validate`] — pre-flight validation of commands and task parameters.
//! - [`error`] — unified error types.

pub mod error;
pub mod intent;
pub mod task;
pub mod validate;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{CoreError, Result};
pub use intent::{Intent, IntentExtractor, KeywordIntentExtractor};
pub use task::{AutomationResult, Task, TaskStatus, TaskType};
pub use validate::{validate_command, validate_task_parameters};
