//! The error handler: classification, recovery dispatch, history, alerts.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classify::classify;
use crate::context::{ErrorCategory, ErrorContext, ErrorSeverity};
use crate::strategy::{Operation, RecoveryStrategy};

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate view over the handler's history.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorStatistics {
    /// Total faults handled.
    pub total_errors: usize,
    /// Fault counts grouped by category.
    pub by_category: HashMap<ErrorCategory, usize>,
    /// Fault counts grouped by severity.
    pub by_severity: HashMap<ErrorSeverity, usize>,
    /// How many faults had a recovery attempt.
    pub recovery_attempts: usize,
    /// How many recovery attempts succeeded.
    pub recovery_successes: usize,
    /// successes / attempts, or 0.0 when nothing was attempted.
    pub recovery_rate: f64,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Classifies faults, drives registered recovery strategies, and keeps an
/// append-only history of everything it has handled.
pub struct ErrorHandler {
    error_log: Vec<ErrorContext>,
    strategies: HashMap<ErrorCategory, Box<dyn RecoveryStrategy>>,
    error_count: u64,
}

impl ErrorHandler {
    /// Create a handler with no registered strategies.
    pub fn new() -> Self {
        Self {
            error_log: Vec::new(),
            strategies: HashMap::new(),
            error_count: 0,
        }
    }

    /// Register a recovery strategy for an error category.
    ///
    /// A later registration for the same category replaces the earlier one.
    pub fn register_strategy(
        &mut self,
        category: ErrorCategory,
        strategy: Box<dyn RecoveryStrategy>,
    ) {
        info!(category = %category, "recovery strategy registered");
        self.strategies.insert(category, strategy);
    }

    /// Handle a typed fault. See [`ErrorHandler::handle_message`].
    pub async fn handle(
        &mut self,
        fault: &(dyn std::error::Error + Send + Sync),
        operation: Option<&dyn Operation>,
        metadata: HashMap<String, String>,
    ) -> ErrorContext {
        self.handle_message(&fault.to_string(), operation, metadata)
            .await
    }

    /// Handle a fault given its message text.
    ///
    /// Classifies the message, captures a best-effort backtrace, attempts
    /// recovery when a strategy is registered for the category *and* a
    /// retriable `operation` was supplied, appends the resulting context to
    /// history, and emits an alert for CRITICAL severity. Faults raised by
    /// the recovery attempt itself are recorded as failed recovery and never
    /// propagate.
    pub async fn handle_message(
        &mut self,
        message: &str,
        operation: Option<&dyn Operation>,
        metadata: HashMap<String, String>,
    ) -> ErrorContext {
        self.error_count += 1;

        let (category, severity) = classify(message);

        let mut context = ErrorContext {
            id: format!("err_{}_{}", self.error_count, Uuid::now_v7().simple()),
            category,
            severity,
            message: message.to_string(),
            timestamp: Utc::now(),
            trace: capture_trace(),
            recovery_attempted: false,
            recovery_successful: false,
            metadata,
        };

        error!(
            error_id = %context.id,
            category = %category,
            severity = %severity,
            message = %context.message,
            "fault handled"
        );

        if let (Some(strategy), Some(operation)) = (self.strategies.get(&category), operation) {
            context.recovery_attempted = true;
            context.recovery_successful =
                strategy.attempt_recovery(&context, Some(operation)).await;

            if context.recovery_successful {
                info!(error_id = %context.id, "recovery successful");
            } else {
                warn!(error_id = %context.id, "recovery failed");
            }
        }

        if context.severity == ErrorSeverity::Critical {
            self.send_critical_alert(&context);
        }

        self.error_log.push(context.clone());
        context
    }

    /// Alert side effect for CRITICAL faults. Delivery beyond structured
    /// logging is an external collaborator's job.
    fn send_critical_alert(&self, context: &ErrorContext) {
        error!(
            alert = true,
            error_id = %context.id,
            category = %context.category,
            message = %context.message,
            "critical error alert"
        );
    }

    /// The append-only history of handled faults, oldest first.
    pub fn history(&self) -> &[ErrorContext] {
        &self.error_log
    }

    /// Compute aggregate statistics over the history.
    ///
    /// One pass over the log; no side effects.
    pub fn statistics(&self) -> ErrorStatistics {
        let mut by_category: HashMap<ErrorCategory, usize> = HashMap::new();
        let mut by_severity: HashMap<ErrorSeverity, usize> = HashMap::new();
        let mut recovery_attempts = 0;
        let mut recovery_successes = 0;

        for context in &self.error_log {
            *by_category.entry(context.category).or_default() += 1;
            *by_severity.entry(context.severity).or_default() += 1;
            if context.recovery_attempted {
                recovery_attempts += 1;
                if context.recovery_successful {
                    recovery_successes += 1;
                }
            }
        }

        let recovery_rate = if recovery_attempts > 0 {
            recovery_successes as f64 / recovery_attempts as f64
        } else {
            0.0
        };

        ErrorStatistics {
            total_errors: self.error_log.len(),
            by_category,
            by_severity,
            recovery_attempts,
            recovery_successes,
            recovery_rate,
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture a backtrace when the runtime has them enabled.
fn capture_trace() -> Option<String> {
    let trace = Backtrace::capture();
    match trace.status() {
        BacktraceStatus::Captured => Some(trace.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::strategy::{BoxError, FallbackStrategy, RetryStrategy};

    struct AlwaysFails;

    #[async_trait]
    impl Operation for AlwaysFails {
        async fn run(&self) -> Result<(), BoxError> {
            Err("still broken".into())
        }
    }

    struct Succeeds {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Operation for Succeeds {
        async fn run(&self) -> Result<(), BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn handle_classifies_and_records() {
        let mut handler = ErrorHandler::new();
        let fault = io::Error::new(io::ErrorKind::Other, "Network connection failed");

        let context = handler.handle(&fault, None, HashMap::new()).await;

        assert_eq!(context.category, ErrorCategory::Network);
        assert_eq!(context.severity, ErrorSeverity::Medium);
        assert!(!context.recovery_attempted);
        assert_eq!(handler.history().len(), 1);
    }

    #[tokio::test]
    async fn context_ids_are_unique_across_bursts() {
        let mut handler = ErrorHandler::new();
        let mut ids = Vec::new();
        for _ in 0..50 {
            let ctx = handler
                .handle_message("invalid input", None, HashMap::new())
                .await;
            ids.push(ctx.id);
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_runs_when_strategy_and_operation_present() {
        let mut handler = ErrorHandler::new();
        handler.register_strategy(
            ErrorCategory::Network,
            Box::new(RetryStrategy::new(3, Duration::from_millis(1))),
        );

        let op = Succeeds {
            calls: AtomicU32::new(0),
        };
        let context = handler
            .handle_message("connection refused", Some(&op), HashMap::new())
            .await;

        assert!(context.recovery_attempted);
        assert!(context.recovery_successful);
        assert_eq!(op.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovery_skipped_without_operation() {
        let mut handler = ErrorHandler::new();
        handler.register_strategy(
            ErrorCategory::Network,
            Box::new(RetryStrategy::new(3, Duration::from_millis(1))),
        );

        let context = handler
            .handle_message("connection refused", None, HashMap::new())
            .await;

        assert!(!context.recovery_attempted);
    }

    #[tokio::test]
    async fn recovery_skipped_for_unregistered_category() {
        let mut handler = ErrorHandler::new();
        let op = AlwaysFails;

        let context = handler
            .handle_message("invalid input format", Some(&op), HashMap::new())
            .await;

        assert_eq!(context.category, ErrorCategory::Validation);
        assert!(!context.recovery_attempted);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_recovery_is_recorded_not_raised() {
        let mut handler = ErrorHandler::new();
        handler.register_strategy(
            ErrorCategory::Network,
            Box::new(RetryStrategy::new(2, Duration::from_millis(1))),
        );

        let op = AlwaysFails;
        let context = handler
            .handle_message("network down", Some(&op), HashMap::new())
            .await;

        assert!(context.recovery_attempted);
        assert!(!context.recovery_successful);
    }

    #[tokio::test]
    async fn fallback_strategy_via_handler() {
        let mut handler = ErrorHandler::new();
        let fallback = Arc::new(Succeeds {
            calls: AtomicU32::new(0),
        });
        handler.register_strategy(
            ErrorCategory::Authentication,
            Box::new(FallbackStrategy::new(fallback.clone())),
        );

        let op = AlwaysFails;
        let context = handler
            .handle_message("unauthorized access", Some(&op), HashMap::new())
            .await;

        assert!(context.recovery_successful);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn statistics_empty_handler() {
        let handler = ErrorHandler::new();
        let stats = handler.statistics();

        assert_eq!(stats.total_errors, 0);
        assert_eq!(stats.recovery_attempts, 0);
        assert_eq!(stats.recovery_rate, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn statistics_aggregate_by_category_severity_and_recovery() {
        let mut handler = ErrorHandler::new();
        handler.register_strategy(
            ErrorCategory::Network,
            Box::new(RetryStrategy::new(1, Duration::from_millis(1))),
        );

        let ok = Succeeds {
            calls: AtomicU32::new(0),
        };
        handler
            .handle_message("connection lost", Some(&ok), HashMap::new())
            .await;
        let bad = AlwaysFails;
        handler
            .handle_message("network flapping", Some(&bad), HashMap::new())
            .await;
        handler
            .handle_message("invalid payload", None, HashMap::new())
            .await;
        handler
            .handle_message("kernel panic", None, HashMap::new())
            .await;

        let stats = handler.statistics();
        assert_eq!(stats.total_errors, 4);
        assert_eq!(stats.by_category[&ErrorCategory::Network], 2);
        assert_eq!(stats.by_category[&ErrorCategory::Validation], 1);
        assert_eq!(stats.by_category[&ErrorCategory::System], 1);
        assert_eq!(stats.by_severity[&ErrorSeverity::Critical], 1);
        assert_eq!(stats.recovery_attempts, 2);
        assert_eq!(stats.recovery_successes, 1);
        assert!((stats.recovery_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn metadata_is_preserved() {
        let mut handler = ErrorHandler::new();
        let metadata = HashMap::from([("task_id".to_string(), "abc".to_string())]);

        let context = handler
            .handle_message("disk full: limit reached", None, metadata)
            .await;

        assert_eq!(context.metadata.get("task_id").unwrap(), "abc");
        assert_eq!(context.category, ErrorCategory::Resource);
    }
}
