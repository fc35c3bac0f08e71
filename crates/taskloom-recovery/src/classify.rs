//! Keyword-based fault classification.
//!
//! Classification is an ordered decision list over the lowercased fault
//! message; the first rule whose keyword set matches wins.

use crate::context::{ErrorCategory, ErrorSeverity};

/// The ordered rule table. Order is load-bearing: earlier rules absorb
/// messages later rules would also match.
const RULES: &[(&[&str], ErrorCategory, ErrorSeverity)] = &[
    (
        &["connection", "network", "timeout", "unreachable"],
        ErrorCategory::Network,
        ErrorSeverity::Medium,
    ),
    (
        &["auth", "permission", "unauthorized", "forbidden"],
        ErrorCategory::Authentication,
        ErrorSeverity::High,
    ),
    (
        &["invalid", "validation", "format", "parse"],
        ErrorCategory::Validation,
        ErrorSeverity::Low,
    ),
    (
        &["memory", "disk", "resource", "limit"],
        ErrorCategory::Resource,
        ErrorSeverity::High,
    ),
    // "timeout" is already absorbed by the network rule above, so this
    // entry never fires on its own. It is kept so the rule table reads as
    // the full taxonomy and so the TIMEOUT category stays addressable for
    // strategy registration.
    (&["timeout"], ErrorCategory::Timeout, ErrorSeverity::Medium),
];

/// Classify a fault message into a (category, severity) pair.
///
/// Matching is case-insensitive substring containment. Messages that match
/// no rule fall through to (SYSTEM, CRITICAL).
pub fn classify(message: &str) -> (ErrorCategory, ErrorSeverity) {
    let lower = message.to_lowercase();

    for (keywords, category, severity) in RULES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return (*category, *severity);
        }
    }

    (ErrorCategory::System, ErrorSeverity::Critical)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
