//! Task execution: intent extraction, type dispatch, result recording.
//!
//! Faults never cross the executor boundary. Whatever the automation
//! backend raises is converted into a failed [`AutomationResult`] and the
//! task is marked failed in place; callers decide what to do with the
//! failure (the orchestrator routes it through error recovery).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use taskloom_core::{
    AutomationResult, Intent, IntentExtractor, KeywordIntentExtractor, Task, TaskStatus, TaskType,
};

/// Boxed fault raised by an automation backend.
pub type AutomationFault = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Automator seam
// ---------------------------------------------------------------------------

/// The automation backend seam.
///
/// Real backends drive browsers, devices, and desktops. The built-in
/// [`SimulatedAutomator`] returns structured action descriptors so the
/// pipeline can run end to end without any of them wired up; tests inject
/// failing implementations to exercise the fault path.
#[async_trait]
pub trait Automator: Send + Sync {
    /// Perform the automation a task requests, given its extracted intent.
    async fn perform(&self, task: &Task, intent: &Intent) -> Result<Value, AutomationFault>;
}

/// Backend stand-in that describes what a real backend would have done.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAutomator;

#[async_trait]
impl Automator for SimulatedAutomator {
    async fn perform(&self, task: &Task, intent: &Intent) -> Result<Value, AutomationFault> {
        let output = match task.task_type {
            TaskType::WebAutomation => json!({
                "action": "web_navigation",
                "intent": intent.label,
                "result": "navigated and completed web automation",
                "steps_executed": 5,
            }),
            TaskType::MobileAutomation => json!({
                "action": "mobile_interaction",
                "intent": intent.label,
                "result": "completed mobile automation",
                "steps_executed": 4,
            }),
            TaskType::DesktopAutomation => json!({
                "action": "desktop_operation",
                "intent": intent.label,
                "result": "completed desktop automation",
                "steps_executed": 3,
            }),
            // Wiring a concrete workflow through the engine is the
            // orchestrator's job; on its own the executor only describes
            // the delegation.
            TaskType::WorkflowAutomation => json!({
                "action": "workflow_execution",
                "intent": intent.label,
                "result": "delegated to workflow engine",
                "integrations_used": ["mail_send", "chat_post", "spreadsheet", "http_request"],
            }),
            TaskType::DataProcessing | TaskType::ApiIntegration => json!({
                "action": "general_automation",
                "intent": intent.label,
                "result": "completed automation task",
                "steps_executed": 2,
            }),
        };
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Aggregate view over the executor's running totals.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorStats {
    /// Tasks executed, successful or not.
    pub total_tasks: usize,
    /// Tasks that completed.
    pub successful_tasks: usize,
    /// Tasks that failed.
    pub failed_tasks: usize,
    /// successes / total, or 0.0 with no tasks.
    pub success_rate: f64,
    /// Mean wall-clock execution time in seconds, 0.0 with no tasks.
    /// Only completed tasks accrue time into the running total.
    pub average_execution_time: f64,
}

/// Executes tasks one at a time and keeps running totals.
pub struct TaskExecutor {
    intent: Arc<dyn IntentExtractor>,
    automator: Arc<dyn Automator>,
    total_tasks: usize,
    successful_tasks: usize,
    failed_tasks: usize,
    total_time: f64,
}

impl TaskExecutor {
    /// Create an executor with the keyword intent extractor and the
    /// simulated backend.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(KeywordIntentExtractor::new()),
            Arc::new(SimulatedAutomator),
        )
    }

    /// Create an executor over explicit collaborators.
    pub fn with_parts(intent: Arc<dyn IntentExtractor>, automator: Arc<dyn Automator>) -> Self {
        Self {
            intent,
            automator,
            total_tasks: 0,
            successful_tasks: 0,
            failed_tasks: 0,
            total_time: 0.0,
        }
    }

    /// Execute a task, mutating its lifecycle state in place.
    ///
    /// Never returns an error: backend faults become a failed
    /// [`AutomationResult`] carrying the fault text.
    pub async fn execute(&mut self, task: &mut Task) -> AutomationResult {
        let started = Instant::now();
        task.status = TaskStatus::Running;
        info!(task_id = %task.id, task_type = %task.task_type, "executing task");

        let intent = self.intent.infer(&task.description).await;
        let metadata = HashMap::from([("ai_confidence".to_string(), json!(intent.confidence))]);

        let outcome = self.automator.perform(task, &intent).await;
        let execution_time = started.elapsed().as_secs_f64();
        self.total_tasks += 1;

        match outcome {
            Ok(output) => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(Utc::now());
                task.result = Some(output.clone());
                self.successful_tasks += 1;
                self.total_time += execution_time;

                info!(
                    task_id = %task.id,
                    execution_time,
                    intent = %intent.label,
                    "task completed"
                );

                AutomationResult {
                    success: true,
                    task_id: task.id,
                    execution_time,
                    output: Some(output),
                    error: None,
                    metadata,
                }
            }
            Err(fault) => {
                let message = fault.to_string();
                task.status = TaskStatus::Failed;
                task.error = Some(message.clone());
                self.failed_tasks += 1;

                warn!(task_id = %task.id, error = %message, "task failed");

                AutomationResult {
                    success: false,
                    task_id: task.id,
                    execution_time,
                    output: None,
                    error: Some(message),
                    metadata,
                }
            }
        }
    }

    /// Success rate and mean execution time from the running totals.
    pub fn stats(&self) -> ExecutorStats {
        let success_rate = if self.total_tasks > 0 {
            self.successful_tasks as f64 / self.total_tasks as f64
        } else {
            0.0
        };
        let average_execution_time = if self.total_tasks > 0 {
            self.total_time / self.total_tasks as f64
        } else {
            0.0
        };

        ExecutorStats {
            total_tasks: self.total_tasks,
            successful_tasks: self.successful_tasks,
            failed_tasks: self.failed_tasks,
            success_rate,
            average_execution_time,
        }
    }
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenAutomator;

    #[async_trait]
    impl Automator for BrokenAutomator {
        async fn perform(&self, _task: &Task, _intent: &Intent) -> Result<Value, AutomationFault> {
            Err("Network connection failed".into())
        }
    }

    fn web_task() -> Task {
        Task::new(
            TaskType::WebAutomation,
            "Open Chrome and search for AI automation tools",
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn successful_execution_completes_task() {
        let mut executor = TaskExecutor::new();
        let mut task = web_task();

        let result = executor.execute(&mut task).await;

        assert!(result.success);
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.completed_at.is_some());

        let output = result.output.unwrap();
        assert_eq!(output["action"], "web_navigation");
        assert_eq!(output["intent"], "open_application");
        assert!(output["steps_executed"].as_i64().unwrap() > 0);
        assert_eq!(result.metadata["ai_confidence"], json!(0.95));
    }

    #[tokio::test]
    async fn dispatch_covers_every_task_type() {
        let mut executor = TaskExecutor::new();
        let expectations = [
            (TaskType::WebAutomation, "web_navigation"),
            (TaskType::MobileAutomation, "mobile_interaction"),
            (TaskType::DesktopAutomation, "desktop_operation"),
            (TaskType::WorkflowAutomation, "workflow_execution"),
            (TaskType::DataProcessing, "general_automation"),
            (TaskType::ApiIntegration, "general_automation"),
        ];

        for (task_type, action) in expectations {
            let mut task = Task::new(task_type, "run it", HashMap::new());
            let result = executor.execute(&mut task).await;
            assert_eq!(result.output.unwrap()["action"], action, "{task_type}");
        }
    }

    #[tokio::test]
    async fn fault_becomes_failed_result_not_panic() {
        let mut executor = TaskExecutor::with_parts(
            Arc::new(KeywordIntentExtractor::new()),
            Arc::new(BrokenAutomator),
        );
        let mut task = web_task();

        let result = executor.execute(&mut task).await;

        assert!(!result.success);
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(
            result.error.as_deref(),
            Some("Network connection failed")
        );
        assert_eq!(task.error, result.error);
        assert!(task.completed_at.is_none());
    }

    #[tokio::test]
    async fn failed_task_time_does_not_accrue_into_the_mean() {
        struct SlowBroken;

        #[async_trait]
        impl Automator for SlowBroken {
            async fn perform(
                &self,
                _task: &Task,
                _intent: &Intent,
            ) -> Result<Value, AutomationFault> {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Err("backend gave up".into())
            }
        }

        let mut executor = TaskExecutor::with_parts(
            Arc::new(KeywordIntentExtractor::new()),
            Arc::new(SlowBroken),
        );
        let mut task = web_task();
        executor.execute(&mut task).await;

        let stats = executor.stats();
        assert_eq!(stats.total_tasks, 1);
        assert_eq!(stats.failed_tasks, 1);
        // The slow failure counted against the totals but contributed no
        // execution time, so the mean stays exactly zero.
        assert_eq!(stats.average_execution_time, 0.0);
    }

    #[tokio::test]
    async fn stats_track_running_totals() {
        let mut executor = TaskExecutor::new();
        assert_eq!(executor.stats().total_tasks, 0);
        assert_eq!(executor.stats().success_rate, 0.0);
        assert_eq!(executor.stats().average_execution_time, 0.0);

        let mut task = web_task();
        executor.execute(&mut task).await;

        let mut failing = TaskExecutor::with_parts(
            Arc::new(KeywordIntentExtractor::new()),
            Arc::new(BrokenAutomator),
        );
        let mut doomed = web_task();
        failing.execute(&mut doomed).await;

        assert_eq!(executor.stats().successful_tasks, 1);
        assert!((executor.stats().success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(failing.stats().failed_tasks, 1);
        assert_eq!(failing.stats().success_rate, 0.0);
    }
}
