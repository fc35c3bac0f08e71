//! The workflow execution engine.
//!
//! Owns workflow definitions, executes them node by node, and records every
//! run in an append-only history.
//!
//! Execution is a single linear pipe: nodes run in the order they were
//! added, each node's output feeding the next node's input. Declared
//! connections are not consulted for ordering. Unknown node types are
//! skipped with a warning rather than failing the run; a node fault marks
//! the workflow failed and propagates to the caller after the failure is
//! recorded.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::model::{Connection, Workflow, WorkflowNode, WorkflowStatus};
use crate::nodes::NodeRegistry;

// ---------------------------------------------------------------------------
// Execution record
// ---------------------------------------------------------------------------

/// Immutable record of one workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    /// The workflow that ran.
    pub workflow_id: Uuid,
    /// Its name at execution time.
    pub workflow_name: String,
    /// When the run started.
    pub executed_at: DateTime<Utc>,
    /// Wall-clock run time in seconds.
    pub execution_time: f64,
    /// `Completed` or `Failed`.
    pub status: WorkflowStatus,
    /// Per-node outputs keyed by node id. Skipped nodes have no entry.
    pub node_results: HashMap<String, Value>,
    /// How many nodes actually executed.
    pub nodes_executed: usize,
    /// The fault message for failed runs.
    pub error: Option<String>,
}

/// Aggregate view over the engine's history.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatistics {
    /// Workflows defined on this engine.
    pub total_workflows: usize,
    /// Total runs, successful or not.
    pub total_executions: usize,
    /// Runs that completed.
    pub successful_executions: usize,
    /// Runs that failed.
    pub failed_executions: usize,
    /// successes / total, or 0.0 with no runs.
    pub success_rate: f64,
    /// Mean run time over completed runs, in seconds.
    pub average_execution_time: f64,
    /// Registered node types.
    pub available_integrations: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns workflows and drives their execution through the node registry.
pub struct WorkflowEngine {
    workflows: HashMap<Uuid, Workflow>,
    registry: NodeRegistry,
    history: Vec<ExecutionRecord>,
}

impl WorkflowEngine {
    /// Create an engine over the given node registry.
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            workflows: HashMap::new(),
            registry,
            history: Vec::new(),
        }
    }

    /// Create an engine with the built-in integrations registered.
    pub fn with_builtins() -> Self {
        Self::new(NodeRegistry::with_builtins())
    }

    /// The node registry backing this engine.
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Create a new empty workflow and return a snapshot of it.
    pub fn create_workflow(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Workflow {
        let workflow = Workflow::new(name, description);
        info!(workflow_id = %workflow.id, name = %workflow.name, "workflow created");
        self.workflows.insert(workflow.id, workflow.clone());
        workflow
    }

    /// Append a node to a workflow.
    ///
    /// The node id is the current node count, so ids follow insertion order.
    pub fn add_node(
        &mut self,
        workflow_id: Uuid,
        node_type: impl Into<String>,
        name: impl Into<String>,
        parameters: HashMap<String, Value>,
        position: (i64, i64),
    ) -> Result<WorkflowNode> {
        let workflow = self
            .workflows
            .get_mut(&workflow_id)
            .ok_or(WorkflowError::WorkflowNotFound { workflow_id })?;

        let node = WorkflowNode {
            id: format!("node_{}", workflow.nodes.len()),
            node_type: node_type.into(),
            name: name.into(),
            parameters,
            position,
        };

        info!(
            workflow_id = %workflow_id,
            node_id = %node.id,
            node_type = %node.node_type,
            "node added"
        );

        workflow.nodes.push(node.clone());
        Ok(node)
    }

    /// Declare a connection between two nodes on their "main" ports.
    ///
    /// Referenced node ids are not validated; connections do not influence
    /// execution order.
    pub fn connect(
        &mut self,
        workflow_id: Uuid,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Result<()> {
        let workflow = self
            .workflows
            .get_mut(&workflow_id)
            .ok_or(WorkflowError::WorkflowNotFound { workflow_id })?;

        let connection = Connection::new(source_node_id, target_node_id);
        info!(
            workflow_id = %workflow_id,
            source = %connection.source_node,
            target = %connection.target_node,
            "nodes connected"
        );
        workflow.connections.push(connection);
        Ok(())
    }

    /// Execute a workflow.
    ///
    /// Runs the nodes in insertion order, threading each output into the
    /// next input, starting from `input`. On success the workflow is marked
    /// completed and the record returned; on a node fault the workflow is
    /// marked failed, a failure record is appended to history, and the
    /// fault propagates to the caller.
    pub async fn execute(
        &mut self,
        workflow_id: Uuid,
        input: Option<Value>,
    ) -> Result<ExecutionRecord> {
        let (name, nodes) = {
            let workflow = self
                .workflows
                .get_mut(&workflow_id)
                .ok_or(WorkflowError::WorkflowNotFound { workflow_id })?;
            workflow.status = WorkflowStatus::Running;
            (workflow.name.clone(), workflow.nodes.clone())
        };

        info!(workflow_id = %workflow_id, name = %name, nodes = nodes.len(), "executing workflow");

        let executed_at = Utc::now();
        let started = Instant::now();
        let mut node_results: HashMap<String, Value> = HashMap::new();
        let mut current = input.unwrap_or(Value::Null);

        for node in &nodes {
            let Some(instance) = self.registry.instantiate(node) else {
                warn!(
                    workflow_id = %workflow_id,
                    node_id = %node.id,
                    node_type = %node.node_type,
                    "unknown node type, skipping"
                );
                continue;
            };

            info!(node_id = %node.id, node_type = %node.node_type, name = %node.name, "executing node");

            match instance.execute(current).await {
                Ok(output) => {
                    node_results.insert(node.id.clone(), output.clone());
                    current = output;
                }
                Err(e) => {
                    let fault = WorkflowError::NodeFailed {
                        node_id: node.id.clone(),
                        node_type: node.node_type.clone(),
                        reason: e.to_string(),
                    };
                    return Err(self.record_failure(
                        workflow_id,
                        name,
                        executed_at,
                        started,
                        node_results,
                        fault,
                    ));
                }
            }
        }

        let execution_time = started.elapsed().as_secs_f64();
        if let Some(workflow) = self.workflows.get_mut(&workflow_id) {
            workflow.status = WorkflowStatus::Completed;
            workflow.last_executed = Some(Utc::now());
        }

        let record = ExecutionRecord {
            workflow_id,
            workflow_name: name.clone(),
            executed_at,
            execution_time,
            status: WorkflowStatus::Completed,
            nodes_executed: node_results.len(),
            node_results,
            error: None,
        };
        self.history.push(record.clone());

        info!(
            workflow_id = %workflow_id,
            name = %name,
            execution_time,
            nodes_executed = record.nodes_executed,
            "workflow completed"
        );

        Ok(record)
    }

    /// Mark a workflow failed, append the failure record, and hand the
    /// fault back for propagation.
    fn record_failure(
        &mut self,
        workflow_id: Uuid,
        workflow_name: String,
        executed_at: DateTime<Utc>,
        started: Instant,
        node_results: HashMap<String, Value>,
        fault: WorkflowError,
    ) -> WorkflowError {
        warn!(workflow_id = %workflow_id, error = %fault, "workflow execution failed");

        if let Some(workflow) = self.workflows.get_mut(&workflow_id) {
            workflow.status = WorkflowStatus::Failed;
        }

        self.history.push(ExecutionRecord {
            workflow_id,
            workflow_name,
            executed_at,
            execution_time: started.elapsed().as_secs_f64(),
            status: WorkflowStatus::Failed,
            nodes_executed: node_results.len(),
            node_results,
            error: Some(fault.to_string()),
        });

        fault
    }

    /// Look up a workflow by id.
    pub fn get_workflow(&self, workflow_id: Uuid) -> Option<&Workflow> {
        self.workflows.get(&workflow_id)
    }

    /// All defined workflows.
    pub fn list_workflows(&self) -> Vec<&Workflow> {
        self.workflows.values().collect()
    }

    /// Execution history, oldest first, optionally filtered by workflow.
    pub fn execution_history(&self, workflow_id: Option<Uuid>) -> Vec<&ExecutionRecord> {
        self.history
            .iter()
            .filter(|r| workflow_id.is_none_or(|id| r.workflow_id == id))
            .collect()
    }

    /// Compute aggregate statistics over the history.
    pub fn statistics(&self) -> WorkflowStatistics {
        let total_executions = self.history.len();
        let successful_executions = self
            .history
            .iter()
            .filter(|r| r.status == WorkflowStatus::Completed)
            .count();
        let failed_executions = total_executions - successful_executions;

        let success_rate = if total_executions > 0 {
            successful_executions as f64 / total_executions as f64
        } else {
            0.0
        };

        let average_execution_time = if successful_executions > 0 {
            self.history
                .iter()
                .filter(|r| r.status == WorkflowStatus::Completed)
                .map(|r| r.execution_time)
                .sum::<f64>()
                / successful_executions as f64
        } else {
            0.0
        };

        WorkflowStatistics {
            total_workflows: self.workflows.len(),
            total_executions,
            successful_executions,
            failed_executions,
            success_rate,
            average_execution_time,
            available_integrations: self.registry.count(),
        }
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
