//! Logging for docfill: subscriber setup, redaction, and form event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{FormEvent, FormEventEntry, FormEventLogger, FORM_EVENTS_TARGET};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
