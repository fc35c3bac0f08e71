//! Task lifecycle types.
//!
//! A [`Task`] is one unit of requested automation work. The orchestrator
//! owns it until execution, at which point the executor mutates its status
//! in place. Every execution attempt produces an immutable
//! [`AutomationResult`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of automation a task requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Browser-driven automation.
    WebAutomation,
    /// Mobile-device automation.
    MobileAutomation,
    /// Desktop application automation.
    DesktopAutomation,
    /// Batch data processing.
    DataProcessing,
    /// Direct third-party API calls.
    ApiIntegration,
    /// Multi-step workflow driven by the workflow engine.
    WorkflowAutomation,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WebAutomation => "web_automation",
            Self::MobileAutomation => "mobile_automation",
            Self::DesktopAutomation => "desktop_automation",
            Self::DataProcessing => "data_processing",
            Self::ApiIntegration => "api_integration",
            Self::WorkflowAutomation => "workflow_automation",
        };
        write!(f, "{s}")
    }
}

/// The lifecycle status of a task.
///
/// Only `Pending → Running → {Completed, Failed}` transitions occur today;
/// `RequiresApproval` is reserved for a human-in-the-loop extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Waiting on human approval before execution.
    RequiresApproval,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RequiresApproval => "requires_approval",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// One unit of requested automation work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier. UUIDv7 — time-ordered and collision-resistant
    /// even under rapid creation.
    pub id: Uuid,
    /// The kind of automation requested.
    pub task_type: TaskType,
    /// Free-text description of the work (fed to intent extraction).
    pub description: String,
    /// Task-type-specific parameters.
    pub parameters: HashMap<String, Value>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// When the task was submitted.
    pub created_at: DateTime<Utc>,
    /// When the task finished successfully, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Structured output from a successful execution.
    pub result: Option<Value>,
    /// Error text from a failed execution.
    pub error: Option<String>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(
        task_type: TaskType,
        description: impl Into<String>,
        parameters: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            task_type,
            description: description.into(),
            parameters,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Automation result
// ---------------------------------------------------------------------------

/// Immutable record of one task execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationResult {
    /// Whether the attempt completed without fault.
    pub success: bool,
    /// The task this result belongs to.
    pub task_id: Uuid,
    /// Wall-clock execution time in seconds.
    pub execution_time: f64,
    /// Structured output (present on success).
    pub output: Option<Value>,
    /// Error text (present on failure).
    pub error: Option<String>,
    /// Free-form metadata, e.g. intent confidence.
    pub metadata: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_pending() {
        let task = Task::new(TaskType::WebAutomation, "Open Chrome", HashMap::new());
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.completed_at.is_none());
        assert!(task.result.is_none());
        assert!(task.error.is_none());
    }

    #[test]
    fn task_ids_are_unique_under_rapid_creation() {
        let ids: Vec<Uuid> = (0..1000)
            .map(|_| Task::new(TaskType::DataProcessing, "t", HashMap::new()).id)
            .collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn task_type_serializes_snake_case() {
        let json = serde_json::to_string(&TaskType::WorkflowAutomation).unwrap();
        assert_eq!(json, "\"workflow_automation\"");
    }

    #[test]
    fn status_roundtrips_through_display_names() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::RequiresApproval,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
