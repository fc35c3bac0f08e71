//! Intent extraction — transforms a task description into a structured intent.
//!
//! Real language models live behind the [`IntentExtractor`] seam; the
//! built-in [`KeywordIntentExtractor`] resolves the common cases with ordered
//! keyword matching so the platform works without any model wired up.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A structured representation of an extracted intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// The high-level action label (e.g. "search", "send_email").
    pub label: String,
    /// Named entities extracted from the text (e.g. `{"browser": "Chrome"}`).
    pub entities: HashMap<String, String>,
    /// Confidence score between 0.0 and 1.0.
    pub confidence: f64,
}

/// The intent-extraction seam.
///
/// Implementations must not fail for well-formed text: unrecognizable input
/// resolves to a catch-all label rather than an error.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Extract a structured intent from free text.
    async fn infer(&self, text: &str) -> Intent;
}

// ---------------------------------------------------------------------------
// Keyword extractor
// ---------------------------------------------------------------------------

/// Ordered keyword-based intent extraction.
///
/// First matching rule wins; anything else falls through to
/// `general_automation`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentExtractor;

impl KeywordIntentExtractor {
    /// Create a new keyword extractor.
    pub fn new() -> Self {
        Self
    }

    fn label_for(text: &str) -> &'static str {
        let lower = text.to_lowercase();
        if lower.contains("open") || lower.contains("launch") {
            "open_application"
        } else if lower.contains("search") || lower.contains("find") {
            "search"
        } else if lower.contains("send") || lower.contains("email") {
            "send_email"
        } else if lower.contains("download") {
            "download"
        } else if lower.contains("upload") {
            "upload"
        } else {
            "general_automation"
        }
    }

    fn entities_for(text: &str) -> HashMap<String, String> {
        let mut entities = HashMap::new();
        for word in text.split_whitespace() {
            let lower = word.to_lowercase();
            if matches!(lower.as_str(), "chrome" | "firefox" | "edge") {
                entities.insert("browser".to_string(), word.to_string());
            } else if word.contains('@') {
                entities.insert("email".to_string(), word.to_string());
            } else if word.starts_with("http") {
                entities.insert("url".to_string(), word.to_string());
            }
        }
        entities
    }
}

#[async_trait]
impl IntentExtractor for KeywordIntentExtractor {
    async fn infer(&self, text: &str) -> Intent {
        let label = Self::label_for(text);
        let entities = Self::entities_for(text);

        debug!(label, entity_count = entities.len(), "intent extracted");

        Intent {
            label: label.to_string(),
            entities,
            confidence: 0.95,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_command_maps_to_open_application() {
        let extractor = KeywordIntentExtractor::new();
        let intent = extractor.infer("Open Chrome and check the dashboard").await;
        assert_eq!(intent.label, "open_application");
        assert_eq!(intent.entities.get("browser").unwrap(), "Chrome");
    }

    #[tokio::test]
    async fn search_command_maps_to_search() {
        let extractor = KeywordIntentExtractor::new();
        let intent = extractor.infer("search for AI automation tools").await;
        assert_eq!(intent.label, "search");
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        // "open" outranks "search" in the rule order.
        let extractor = KeywordIntentExtractor::new();
        let intent = extractor.infer("Open Chrome and search for rust").await;
        assert_eq!(intent.label, "open_application");
    }

    #[tokio::test]
    async fn email_and_url_entities_are_captured() {
        let extractor = KeywordIntentExtractor::new();
        let intent = extractor
            .infer("send report to team@example.com from https://reports.example.com")
            .await;
        assert_eq!(intent.label, "send_email");
        assert_eq!(intent.entities.get("email").unwrap(), "team@example.com");
        assert_eq!(
            intent.entities.get("url").unwrap(),
            "https://reports.example.com"
        );
    }

    #[tokio::test]
    async fn unrecognized_text_never_fails() {
        let extractor = KeywordIntentExtractor::new();
        let intent = extractor.infer("quux the frobnicator").await;
        assert_eq!(intent.label, "general_automation");
        assert!(intent.entities.is_empty());
        assert!(intent.confidence > 0.0 && intent.confidence <= 1.0);
    }
}
