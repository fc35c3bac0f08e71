//! Error taxonomy and the per-fault context record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// The category axis of fault classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Connectivity failures: unreachable hosts, dropped connections.
    Network,
    /// Credential and permission failures.
    Authentication,
    /// Malformed or rejected input.
    Validation,
    /// Exhausted memory, disk, or quota.
    Resource,
    /// An operation exceeded its time budget.
    Timeout,
    /// Catch-all for everything else.
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::Validation => "validation",
            Self::Resource => "resource",
            Self::Timeout => "timeout",
            Self::System => "system",
        };
        write!(f, "{s}")
    }
}

/// The severity axis of fault classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Recoverable without intervention.
    Low,
    /// Degraded but functional.
    Medium,
    /// Requires attention soon.
    High,
    /// Requires immediate attention; triggers an alert.
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Context record
// ---------------------------------------------------------------------------

/// The structured record produced whenever a fault is handled.
///
/// Appended to the handler's history and never mutated afterwards except
/// for the recovery flags set during the handling pass itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique id: a handler-local sequence number plus a UUIDv7 suffix, so
    /// ids stay unique under rapid fault bursts.
    pub id: String,
    /// Classified category.
    pub category: ErrorCategory,
    /// Classified severity.
    pub severity: ErrorSeverity,
    /// The fault's message text.
    pub message: String,
    /// When the fault was handled.
    pub timestamp: DateTime<Utc>,
    /// Best-effort captured backtrace, when available.
    pub trace: Option<String>,
    /// Whether a recovery strategy was invoked for this fault.
    pub recovery_attempted: bool,
    /// Whether that recovery attempt succeeded.
    pub recovery_successful: bool,
    /// Free-form metadata supplied by the caller.
    pub metadata: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::Authentication).unwrap();
        assert_eq!(json, "\"authentication\"");
    }

    #[test]
    fn severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn display_matches_serde_names() {
        for category in [
            ErrorCategory::Network,
            ErrorCategory::Authentication,
            ErrorCategory::Validation,
            ErrorCategory::Resource,
            ErrorCategory::Timeout,
            ErrorCategory::System,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }
}
