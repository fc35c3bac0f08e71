//! The orchestrator: queue, persistence, and the submit → execute →
//! persist pipeline.
//!
//! Composes the executor, error handler, workflow engine, task store, and
//! credential store. Automation faults surface as failed results and are
//! routed through error recovery; only submission rejection and store
//! failures propagate to the caller. The queue is plain FIFO and
//! `execute_next` is pop-then-execute, so concurrent callers need external
//! serialization.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use taskloom_core::{
    validate_command, validate_task_parameters, AutomationResult, Task, TaskStatus, TaskType,
};
use taskloom_recovery::{ErrorCategory, ErrorHandler, ErrorStatistics, RetryStrategy};
use taskloom_store::TaskStore;
use taskloom_vault::CredentialStore;
use taskloom_workflow::{WorkflowEngine, WorkflowStatistics};

use crate::error::RuntimeResult;
use crate::executor::{ExecutorStats, TaskExecutor};

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate view over the whole platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatistics {
    /// Executor running totals.
    pub tasks: ExecutorStats,
    /// Error handler aggregates.
    pub errors: ErrorStatistics,
    /// Workflow engine aggregates.
    pub workflows: WorkflowStatistics,
    /// Tasks waiting in the queue.
    pub queue_length: usize,
    /// When this snapshot was taken.
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the task queue and drives tasks through execution and persistence.
pub struct Orchestrator {
    executor: TaskExecutor,
    errors: ErrorHandler,
    engine: WorkflowEngine,
    store: TaskStore,
    credentials: CredentialStore,
    queue: VecDeque<Task>,
}

impl Orchestrator {
    /// Create an orchestrator over a task store and credential store.
    ///
    /// Network and timeout faults get a retrying recovery strategy out of
    /// the box; callers register further strategies through
    /// [`Orchestrator::recovery`].
    pub fn new(store: TaskStore, credentials: CredentialStore) -> Self {
        let mut errors = ErrorHandler::new();
        errors.register_strategy(ErrorCategory::Network, Box::new(RetryStrategy::default()));
        errors.register_strategy(ErrorCategory::Timeout, Box::new(RetryStrategy::default()));

        Self {
            executor: TaskExecutor::new(),
            errors,
            engine: WorkflowEngine::with_builtins(),
            store,
            credentials,
            queue: VecDeque::new(),
        }
    }

    /// Replace the executor, e.g. to inject a different intent extractor
    /// or automation backend.
    pub fn with_executor(mut self, executor: TaskExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Validate and enqueue a task; returns its id.
    ///
    /// Rejected tasks never touch the queue or the store.
    pub async fn submit(
        &mut self,
        task_type: TaskType,
        description: impl Into<String>,
        parameters: HashMap<String, Value>,
    ) -> RuntimeResult<Uuid> {
        let description = description.into();
        validate_command(&description)?;
        validate_task_parameters(&parameters)?;

        let task = Task::new(task_type, description, parameters);
        let id = task.id;

        self.store.save_task(&task).await?;
        self.store.log_event(id, "submitted", None).await?;
        info!(task_id = %id, task_type = %task.task_type, "task submitted");
        self.queue.push_back(task);

        Ok(id)
    }

    /// Execute the oldest queued task, or return `None` when the queue is
    /// empty.
    ///
    /// Failed results are routed through the error handler before the
    /// updated task state is persisted. Store failures propagate.
    pub async fn execute_next(&mut self) -> RuntimeResult<Option<AutomationResult>> {
        let Some(mut task) = self.queue.pop_front() else {
            return Ok(None);
        };

        let result = match self.bound_workflow(&task) {
            Some(workflow_id) => self.execute_workflow_task(&mut task, workflow_id).await,
            None => self.executor.execute(&mut task).await,
        };

        if let Some(message) = &result.error {
            let metadata = HashMap::from([("task_id".to_string(), task.id.to_string())]);
            self.errors.handle_message(message, None, metadata).await;
        }

        self.store.update_task(&task).await?;
        let event = if result.success { "completed" } else { "failed" };
        self.store
            .log_event(task.id, event, result.output.clone())
            .await?;

        Ok(Some(result))
    }

    /// Drain the queue, executing every task in FIFO order.
    pub async fn execute_all(&mut self) -> RuntimeResult<Vec<AutomationResult>> {
        let mut results = Vec::with_capacity(self.queue.len());
        while let Some(result) = self.execute_next().await? {
            results.push(result);
        }
        Ok(results)
    }

    /// The workflow id a workflow-typed task is bound to, when its
    /// `workflow_id` parameter names a workflow this engine knows.
    fn bound_workflow(&self, task: &Task) -> Option<Uuid> {
        if task.task_type != TaskType::WorkflowAutomation {
            return None;
        }
        let id = task
            .parameters
            .get("workflow_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())?;
        self.engine.get_workflow(id).map(|_| id)
    }

    /// Run a bound workflow through the engine and record the outcome on
    /// the task. Engine faults become a failed result here, matching the
    /// executor's boundary behavior.
    async fn execute_workflow_task(
        &mut self,
        task: &mut Task,
        workflow_id: Uuid,
    ) -> AutomationResult {
        task.status = TaskStatus::Running;
        let input = task.parameters.get("input").cloned();
        let metadata = HashMap::from([("workflow_id".to_string(), json!(workflow_id))]);
        let started = Instant::now();

        match self.engine.execute(workflow_id, input).await {
            Ok(record) => {
                let output = json!({
                    "action": "workflow_execution",
                    "workflow": record.workflow_name,
                    "nodes_executed": record.nodes_executed,
                    "node_results": record.node_results,
                });
                task.status = TaskStatus::Completed;
                task.completed_at = Some(Utc::now());
                task.result = Some(output.clone());

                AutomationResult {
                    success: true,
                    task_id: task.id,
                    execution_time: record.execution_time,
                    output: Some(output),
                    error: None,
                    metadata,
                }
            }
            Err(fault) => {
                let message = fault.to_string();
                warn!(task_id = %task.id, workflow_id = %workflow_id, error = %message, "workflow task failed");
                task.status = TaskStatus::Failed;
                task.error = Some(message.clone());

                AutomationResult {
                    success: false,
                    task_id: task.id,
                    execution_time: started.elapsed().as_secs_f64(),
                    output: None,
                    error: Some(message),
                    metadata,
                }
            }
        }
    }

    /// The workflow engine, for defining and inspecting workflows.
    pub fn workflows(&mut self) -> &mut WorkflowEngine {
        &mut self.engine
    }

    /// The error handler, for registering strategies and reading history.
    pub fn recovery(&mut self) -> &mut ErrorHandler {
        &mut self.errors
    }

    /// The credential store shared with integration adapters.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// The backing task store.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Tasks currently waiting in the queue.
    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    /// Snapshot aggregate statistics across every component.
    pub fn statistics(&self) -> PlatformStatistics {
        PlatformStatistics {
            tasks: self.executor.stats(),
            errors: self.errors.statistics(),
            workflows: self.engine.statistics(),
            queue_length: self.queue.len(),
            generated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
