//! # taskloom-runtime
//!
//! The orchestration layer of the Taskloom platform: task execution with
//! intent extraction, the FIFO task queue, and the submit → execute →
//! persist pipeline that ties the executor, error recovery, workflow
//! engine, and task store together.
//!
//! ## Modules
//!
//! - [`executor`] — [`TaskExecutor`], the [`Automator`] backend seam.
//! - [`orchestrator`] — [`Orchestrator`] and platform-wide statistics.
//! - [`error`] — unified error types.

pub mod error;
pub mod executor;
pub mod orchestrator;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{RuntimeError, RuntimeResult};
pub use executor::{AutomationFault, Automator, ExecutorStats, SimulatedAutomator, TaskExecutor};
pub use orchestrator::{Orchestrator, PlatformStatistics};
