//! Pre-flight input validation.
//!
//! Pure, stateless checks applied before a task is accepted: email and URL
//! shape validation, command sanity checks with a dangerous-substring
//! deny-list, and task-parameter cross-checks keyed on an optional `type`
//! field.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Maximum accepted command length in characters.
pub const MAX_COMMAND_LENGTH: usize = 1000;

/// Substrings that cause a command to be rejected outright.
const DANGEROUS_KEYWORDS: &[&str] = &["rm -rf", "format", "delete system"];

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| unreachable!("email pattern is valid: {e}"))
    })
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://[A-Za-z0-9.-]+\.[A-Za-z]{2,}(/.*)?$")
            .unwrap_or_else(|e| unreachable!("url pattern is valid: {e}"))
    })
}

/// Check whether `email` has a plausible address shape.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Check whether `url` is a plausible http(s) URL.
pub fn is_valid_url(url: &str) -> bool {
    url_regex().is_match(url)
}

/// Validate a free-text automation command.
///
/// Rejects empty or whitespace-only input, input longer than
/// [`MAX_COMMAND_LENGTH`] characters, and input containing any deny-listed
/// substring (case-insensitive).
pub fn validate_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(CoreError::EmptyCommand);
    }

    let length = command.chars().count();
    if length > MAX_COMMAND_LENGTH {
        return Err(CoreError::CommandTooLong {
            length,
            max: MAX_COMMAND_LENGTH,
        });
    }

    let lower = command.to_lowercase();
    for keyword in DANGEROUS_KEYWORDS {
        if lower.contains(keyword) {
            return Err(CoreError::DangerousKeyword {
                keyword: (*keyword).to_string(),
            });
        }
    }

    Ok(())
}

/// Validate a task parameter map.
///
/// When the map carries a `type` field, type-specific optional fields are
/// cross-checked: `web_automation` + `url` must be a well-formed URL,
/// `email` + `to` must be a well-formed address. Absent optional fields are
/// not an error.
pub fn validate_task_parameters(params: &HashMap<String, Value>) -> Result<()> {
    let Some(task_type) = params.get("type").and_then(Value::as_str) else {
        return Ok(());
    };

    if task_type == "web_automation" {
        if let Some(url) = params.get("url").and_then(Value::as_str) {
            if !is_valid_url(url) {
                return Err(CoreError::InvalidParameter {
                    field: "url".to_string(),
                    reason: format!("`{url}` is not a valid URL"),
                });
            }
        }
    }

    if task_type == "email" {
        if let Some(to) = params.get("to").and_then(Value::as_str) {
            if !is_valid_email(to) {
                return Err(CoreError::InvalidParameter {
                    field: "to".to_string(),
                    reason: format!("`{to}` is not a valid email address"),
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_email_accepted() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
    }

    #[test]
    fn invalid_email_rejected() {
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("user@no-tld"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn valid_url_accepted() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/path?q=1"));
    }

    #[test]
    fn invalid_url_rejected() {
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url("ftp://example.com"));
    }

    #[test]
    fn empty_command_rejected_with_reason() {
        let err = validate_command("").unwrap_err();
        assert!(!err.to_string().is_empty());

        let err = validate_command("   ").unwrap_err();
        assert!(matches!(err, CoreError::EmptyCommand));
    }

    #[test]
    fn overlong_command_rejected_mentioning_length() {
        let command = "a".repeat(1001);
        let err = validate_command(&command).unwrap_err();
        assert!(matches!(err, CoreError::CommandTooLong { .. }));
        assert!(err.to_string().contains("long"));
    }

    #[test]
    fn boundary_length_command_accepted() {
        let command = "a".repeat(1000);
        assert!(validate_command(&command).is_ok());
    }

    #[test]
    fn dangerous_command_rejected_mentioning_keyword() {
        let err = validate_command("rm -rf /").unwrap_err();
        assert!(err.to_string().contains("rm -rf"));

        // Deny-list matching is case-insensitive.
        let err = validate_command("please FORMAT the drive").unwrap_err();
        assert!(matches!(err, CoreError::DangerousKeyword { .. }));
    }

    #[test]
    fn benign_command_accepted() {
        assert!(validate_command("Open Chrome and search for AI tools").is_ok());
    }

    #[test]
    fn parameters_without_type_pass() {
        let params = HashMap::from([("anything".to_string(), json!(42))]);
        assert!(validate_task_parameters(&params).is_ok());
    }

    #[test]
    fn web_automation_url_is_checked_when_present() {
        let params = HashMap::from([
            ("type".to_string(), json!("web_automation")),
            ("url".to_string(), json!("not-a-url")),
        ]);
        let err = validate_task_parameters(&params).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter { .. }));

        let params = HashMap::from([
            ("type".to_string(), json!("web_automation")),
            ("url".to_string(), json!("https://example.com")),
        ]);
        assert!(validate_task_parameters(&params).is_ok());
    }

    #[test]
    fn web_automation_without_url_passes() {
        let params = HashMap::from([("type".to_string(), json!("web_automation"))]);
        assert!(validate_task_parameters(&params).is_ok());
    }

    #[test]
    fn email_recipient_is_checked_when_present() {
        let params = HashMap::from([
            ("type".to_string(), json!("email")),
            ("to".to_string(), json!("not-an-address")),
        ]);
        assert!(validate_task_parameters(&params).is_err());

        let params = HashMap::from([
            ("type".to_string(), json!("email")),
            ("to".to_string(), json!("team@example.com")),
        ]);
        assert!(validate_task_parameters(&params).is_ok());
    }
}
