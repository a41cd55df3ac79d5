//! Form Event Logger
//!
//! Structured records of what happened to a form (seeded, configured,
//! validated, generated), emitted under the `form_events` target so they
//! can be filtered out of the general log stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

pub const FORM_EVENTS_TARGET: &str = "form_events";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum FormEvent {
    TemplateSeeded {
        source: String,
        placeholder_count: usize,
    },
    FieldConfigured {
        name: String,
        kind: String,
        required: bool,
        conditional: bool,
        depends_on: Vec<String>,
    },
    SuggestionAccepted {
        name: String,
        source_text: String,
    },
    ValidationFailed {
        missing: Vec<String>,
    },
    DocumentGenerated {
        policy: String,
        length: usize,
        warnings: usize,
    },
    EnrichmentFallback {
        operation: String,
        error: String,
    },
}

impl FormEvent {
    /// Scrub free-text fields. Names and counts are left alone.
    fn redacted(mut self) -> Self {
        match &mut self {
            FormEvent::SuggestionAccepted { source_text, .. } => {
                *source_text = redact_sensitive_data(source_text);
            }
            FormEvent::EnrichmentFallback { error, .. } => {
                *error = redact_sensitive_data(error);
            }
            FormEvent::TemplateSeeded { source, .. } => {
                *source = redact_sensitive_data(source);
            }
            _ => {}
        }
        self
    }
}

#[derive(Debug, Serialize)]
pub struct FormEventEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: FormEvent,
}

impl FormEventEntry {
    pub fn new(session_id: &str, event: FormEvent) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            event: event.redacted(),
        }
    }
}

pub struct FormEventLogger;

impl FormEventLogger {
    pub fn log_event(session_id: &str, event: FormEvent) {
        let entry = FormEventEntry::new(session_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: FORM_EVENTS_TARGET, event = %json, "Form event"),
            Err(_) => info!(target: FORM_EVENTS_TARGET, event = ?entry, "Form event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_free_text_fields() {
        let entry = FormEventEntry::new(
            "cli",
            FormEvent::SuggestionAccepted {
                name: "email".to_string(),
                source_text: "jane@example.com".to_string(),
            },
        );
        assert_eq!(
            entry.event,
            FormEvent::SuggestionAccepted {
                name: "email".to_string(),
                source_text: "[REDACTED_EMAIL]".to_string(),
            }
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let entry = FormEventEntry::new(
            "s-1",
            FormEvent::ValidationFailed {
                missing: vec!["children-names".to_string()],
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "ValidationFailed");
        assert_eq!(json["event"]["missing"][0], "children-names");
        assert_eq!(json["session_id"], "s-1");
    }

    #[test]
    fn log_event_without_subscriber_is_fine() {
        FormEventLogger::log_event(
            "s-2",
            FormEvent::EnrichmentFallback {
                operation: "cleanup".to_string(),
                error: "401 for Bearer abcdef123456".to_string(),
            },
        );
    }
}
