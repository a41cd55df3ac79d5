//! Log Redaction
//!
//! Scrubs API keys, bearer tokens, e-mail addresses and phone numbers from
//! free text before it reaches a log sink. Form values routinely carry
//! personal data, so anything user-entered goes through here.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
});
static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
        .expect("phone pattern is valid")
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[A-Za-z0-9\-_]{20,})|(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)")
        .expect("token pattern is valid")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // Tokens first: long keys contain digit runs the phone pattern would split.
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = EMAIL_RE.replace_all(&redacted, "[REDACTED_EMAIL]");
    TELEPHONE_RE
        .replace_all(&redacted, "[REDACTED_PHONE]")
        .into_owned()
}
