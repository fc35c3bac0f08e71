//! # taskloom-store
//!
//! SQLite-backed persistence for Taskloom tasks and their execution log.
//!
//! [`Database`] wraps a `rusqlite::Connection` behind `Arc<Mutex<>>` and
//! dispatches work onto the blocking thread pool; [`TaskStore`] layers the
//! task schema and idempotent save/update upserts on top.

pub mod db;
pub mod error;
pub mod task_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use task_store::{ExecutionEvent, TaskStore};
