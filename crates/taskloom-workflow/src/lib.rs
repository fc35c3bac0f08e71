//! # taskloom-workflow
//!
//! Workflow definitions and the engine that executes them.
//!
//! A workflow is a named, ordered collection of nodes plus declared
//! connections. Each node is bound to an integration adapter by a type tag
//! resolved through the [`NodeRegistry`]; execution runs the nodes in
//! insertion order, piping each node's output into the next.
//!
//! ## Modules
//!
//! - [`model`] — [`Workflow`], [`WorkflowNode`], [`Connection`], status.
//! - [`nodes`] — the [`IntegrationNode`] trait, built-in adapters, registry.
//! - [`engine`] — [`WorkflowEngine`], execution history, statistics.
//! - [`error`] — unified error types.

pub mod engine;
pub mod error;
pub mod model;
pub mod nodes;

// ── re-exports ───────────────────────────────────────────────────────

pub use engine::{ExecutionRecord, WorkflowEngine, WorkflowStatistics};
pub use error::{Result, WorkflowError};
pub use model::{Connection, Workflow, WorkflowNode, WorkflowStatus};
pub use nodes::{IntegrationNode, NodeFactory, NodeRegistry};
