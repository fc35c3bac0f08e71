//! Pluggable recovery strategies.
//!
//! A [`RecoveryStrategy`] is registered against exactly one error category
//! and invoked by the handler after classification. Two behaviors ship
//! built in: [`RetryStrategy`] (exponential backoff) and
//! [`FallbackStrategy`] (single substitute operation).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::context::ErrorContext;

/// Boxed error type returned by recoverable operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A retriable unit of work.
///
/// Test doubles implement this with counters; production callers wrap the
/// failing call site. Strategies never let a fault raised here propagate.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Run the operation once.
    async fn run(&self) -> Result<(), BoxError>;
}

/// A pluggable recovery behavior.
#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    /// Attempt to recover from the fault described by `context`.
    ///
    /// `operation` is the original failing operation, when the caller could
    /// supply one. Returns whether recovery succeeded. Must not propagate
    /// faults raised during the attempt.
    async fn attempt_recovery(
        &self,
        context: &ErrorContext,
        operation: Option<&dyn Operation>,
    ) -> bool;
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Retry the failing operation with exponential backoff.
///
/// Sleeps `base_delay * 2^attempt` before each attempt (attempt indices
/// starting at 0), up to `max_retries` attempts.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryStrategy {
    /// Create a retry strategy with the given attempt bound and base delay.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[async_trait]
impl RecoveryStrategy for RetryStrategy {
    async fn attempt_recovery(
        &self,
        context: &ErrorContext,
        operation: Option<&dyn Operation>,
    ) -> bool {
        let Some(operation) = operation else {
            warn!(error_id = %context.id, "retry strategy invoked without an operation");
            return false;
        };

        for attempt in 0..self.max_retries {
            let delay = self.base_delay * 2u32.pow(attempt);
            info!(
                error_id = %context.id,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                delay = ?delay,
                "retrying after delay"
            );
            tokio::time::sleep(delay).await;

            match operation.run().await {
                Ok(()) => {
                    info!(error_id = %context.id, attempt = attempt + 1, "retry succeeded");
                    return true;
                }
                Err(e) => {
                    warn!(
                        error_id = %context.id,
                        attempt = attempt + 1,
                        error = %e,
                        "retry attempt failed"
                    );
                }
            }
        }

        false
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Run a single substitute operation in place of the failing one.
pub struct FallbackStrategy {
    fallback: Arc<dyn Operation>,
}

impl FallbackStrategy {
    /// Create a fallback strategy around the given substitute operation.
    pub fn new(fallback: Arc<dyn Operation>) -> Self {
        Self { fallback }
    }
}

#[async_trait]
impl RecoveryStrategy for FallbackStrategy {
    async fn attempt_recovery(
        &self,
        context: &ErrorContext,
        _operation: Option<&dyn Operation>,
    ) -> bool {
        info!(error_id = %context.id, "attempting fallback");

        match self.fallback.run().await {
            Ok(()) => true,
            Err(e) => {
                error!(error_id = %context.id, error = %e, "fallback failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;

    use crate::context::{ErrorCategory, ErrorSeverity};

    fn test_context() -> ErrorContext {
        ErrorContext {
            id: "err_test".to_string(),
            category: ErrorCategory::Network,
            severity: ErrorSeverity::Medium,
            message: "connection refused".to_string(),
            timestamp: Utc::now(),
            trace: None,
            recovery_attempted: false,
            recovery_successful: false,
            metadata: HashMap::new(),
        }
    }

    /// Fails `fail_until` times, then succeeds.
    struct FlakyOperation {
        calls: AtomicU32,
        fail_until: u32,
    }

    impl FlakyOperation {
        fn new(fail_until: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_until,
            }
        }
    }

    #[async_trait]
    impl Operation for FlakyOperation {
        async fn run(&self) -> Result<(), BoxError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_until {
                Err(format!("simulated failure {call}").into())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_makes_exactly_max_attempts_on_persistent_failure() {
        let strategy = RetryStrategy::new(3, Duration::from_millis(10));
        let op = FlakyOperation::new(u32::MAX);
        let context = test_context();

        let recovered = strategy.attempt_recovery(&context, Some(&op)).await;

        assert!(!recovered);
        assert_eq!(op.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_backoff_doubles_between_attempts() {
        let strategy = RetryStrategy::new(3, Duration::from_millis(10));
        let op = FlakyOperation::new(u32::MAX);
        let context = test_context();

        let start = tokio::time::Instant::now();
        strategy.attempt_recovery(&context, Some(&op)).await;

        // Paused-clock elapsed time is exactly the sum of the backoff
        // schedule: 10ms + 20ms + 40ms.
        assert_eq!(start.elapsed(), Duration::from_millis(70));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_at_first_success() {
        let strategy = RetryStrategy::new(3, Duration::from_millis(1));
        let op = FlakyOperation::new(1); // fail once, then succeed
        let context = test_context();

        let recovered = strategy.attempt_recovery(&context, Some(&op)).await;

        assert!(recovered);
        assert_eq!(op.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_without_operation_fails_cleanly() {
        let strategy = RetryStrategy::new(3, Duration::from_millis(1));
        let context = test_context();

        assert!(!strategy.attempt_recovery(&context, None).await);
    }

    #[tokio::test]
    async fn fallback_success() {
        let fallback = Arc::new(FlakyOperation::new(0));
        let strategy = FallbackStrategy::new(fallback.clone());
        let context = test_context();

        assert!(strategy.attempt_recovery(&context, None).await);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fallback_runs_exactly_once_and_swallows_failure() {
        let fallback = Arc::new(FlakyOperation::new(u32::MAX));
        let strategy = FallbackStrategy::new(fallback.clone());
        let context = test_context();

        assert!(!strategy.attempt_recovery(&context, None).await);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }
}
