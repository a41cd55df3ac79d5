//! Turning raw model output into usable values.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use docfill_core::{PlaceholderName, SuggestedPlaceholder};

const SUGGESTIONS_KEY: &str = "suggested_placeholders";

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "markdown", ...) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Lowercase, hyphen-separated form of a proposed name.
pub fn normalize_name(raw: &str) -> Option<PlaceholderName> {
    let mut out = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for ch in raw.trim().trim_start_matches("${").trim_end_matches('}').chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    PlaceholderName::parse(&out).ok()
}

/// Parse a suggestion response.
///
/// Accepts `{"suggested_placeholders": {text: name}}` or a bare
/// `{text: name}` object. Anything else yields an empty list.
pub fn parse_suggestions(raw: &str) -> Vec<SuggestedPlaceholder> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        warn!("Empty suggestion response");
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Suggestion response is not JSON");
            return Vec::new();
        }
    };

    let Some(map) = suggestion_map(&value) else {
        warn!("Suggestion response has no placeholder mapping");
        return Vec::new();
    };

    let mut out: Vec<SuggestedPlaceholder> = Vec::new();
    for (source, name) in map {
        let Some(name) = name.as_str().and_then(normalize_name) else {
            debug!(source = %source, "Skipping suggestion without a usable name");
            continue;
        };
        if source.trim().is_empty() || out.iter().any(|s| s.name == name) {
            continue;
        }
        out.push(SuggestedPlaceholder::new(source.trim(), name));
    }
    out
}

fn suggestion_map(value: &Value) -> Option<&Map<String, Value>> {
    let obj = value.as_object()?;
    match obj.get(SUGGESTIONS_KEY) {
        Some(inner) => inner.as_object(),
        None => Some(obj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[SuggestedPlaceholder]) -> Vec<&str> {
        list.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("Client Name").unwrap().as_str(), "client-name");
        assert_eq!(normalize_name("${start_date}").unwrap().as_str(), "start-date");
        assert!(normalize_name("  --  ").is_none());
    }

    #[test]
    fn parses_wrapped_response() {
        let raw = r#"{"suggested_placeholders": {"Jane Doe": "full-name", "Acme Corp": "company"}}"#;
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.len(), 2);
        assert!(parsed
            .iter()
            .any(|s| s.source_text == "Jane Doe" && s.name.as_str() == "full-name"));
    }

    #[test]
    fn parses_bare_mapping_and_dedups() {
        let raw = "```json\n{\"March 3\": \"start date\", \"3/3\": \"start-date\"}\n```";
        assert_eq!(names(&parse_suggestions(raw)), vec!["start-date"]);
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_suggestions("").is_empty());
        assert!(parse_suggestions("not json at all").is_empty());
        assert!(parse_suggestions("[1, 2, 3]").is_empty());
        assert!(parse_suggestions(r#"{"suggested_placeholders": "none"}"#).is_empty());
    }

    #[test]
    fn drops_non_string_names() {
        let raw = r#"{"Jane": 42, "Bob": "person"}"#;
        assert_eq!(names(&parse_suggestions(raw)), vec!["person"]);
    }
}
