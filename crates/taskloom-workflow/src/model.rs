//! Workflow data model.
//!
//! Workflows own append-only lists of nodes and connections. Connections
//! are declarative: they record intended data flow between named ports but
//! the engine executes nodes strictly in insertion order today.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The current execution status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Defined but never started.
    Idle,
    /// Currently executing.
    Running,
    /// Last execution completed successfully.
    Completed,
    /// Last execution failed.
    Failed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One step in a workflow, bound to an integration adapter by type tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Position-based id assigned at add time (`node_0`, `node_1`, ...).
    /// Node removal is not supported, so these stay stable.
    pub id: String,
    /// The registry tag naming the adapter that runs this node.
    pub node_type: String,
    /// Display name.
    pub name: String,
    /// Adapter-specific parameters.
    pub parameters: HashMap<String, Value>,
    /// 2-D canvas position. Presentation only; no execution semantics.
    pub position: (i64, i64),
}

/// A declared edge between two nodes.
///
/// Purely declarative today: the engine does not consult connections when
/// choosing execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Id of the node the data flows from.
    pub source_node: String,
    /// Id of the node the data flows to.
    pub target_node: String,
    /// Named output port on the source node.
    pub source_output: String,
    /// Named input port on the target node.
    pub target_input: String,
}

impl Connection {
    /// Create a connection between two nodes on the default "main" ports.
    pub fn new(source_node: impl Into<String>, target_node: impl Into<String>) -> Self {
        Self {
            source_node: source_node.into(),
            target_node: target_node.into(),
            source_output: "main".to_string(),
            target_input: "main".to_string(),
        }
    }
}

/// A complete workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// What this workflow does.
    pub description: String,
    /// Ordered node sequence; execution follows this order.
    pub nodes: Vec<WorkflowNode>,
    /// Declared connections between nodes.
    pub connections: Vec<Connection>,
    /// Current execution status.
    pub status: WorkflowStatus,
    /// When the workflow was created.
    pub created_at: DateTime<Utc>,
    /// When the workflow last finished executing successfully.
    pub last_executed: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Create an empty idle workflow.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: description.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
            status: WorkflowStatus::Idle,
            created_at: Utc::now(),
            last_executed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
