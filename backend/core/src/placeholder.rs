//! Placeholder names and the extractor that finds them in document text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{DocfillError, Result};

/// Matches `${name}` up to the first closing brace on the same line.
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}\n]*)\}").expect("placeholder pattern is valid"));

/// Canonical placeholder identifier with all delimiter syntax stripped.
///
/// `${name}`, `{name}` and `name` all parse to the same value. Comparison is
/// exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderName(String);

impl PlaceholderName {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let inner = trimmed
            .strip_prefix("${")
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
            .unwrap_or(trimmed)
            .trim();

        if inner.is_empty() {
            return Err(DocfillError::InvalidName(raw.to_string()));
        }
        Ok(Self(inner.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form that appears in documents, e.g. `${full-name}`.
    pub fn delimited(&self) -> String {
        format!("${{{}}}", self.0)
    }
}

impl fmt::Display for PlaceholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlaceholderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for PlaceholderName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PlaceholderName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PlaceholderName::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Extract distinct placeholder names in first-seen order.
///
/// Absent or empty text yields no placeholders.
pub fn extract(text: Option<&str>) -> Vec<PlaceholderName> {
    match text {
        Some(text) if !text.is_empty() => extract_str(text),
        _ => {
            debug!("No document content; nothing to extract");
            Vec::new()
        }
    }
}

pub fn extract_str(text: &str) -> Vec<PlaceholderName> {
    let mut names: Vec<PlaceholderName> = Vec::new();
    for caps in PLACEHOLDER_PATTERN.captures_iter(text) {
        let Ok(name) = PlaceholderName::parse(&caps[1]) else {
            continue;
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    debug!(count = names.len(), "Extracted placeholders");
    names
}

/// Rewrite every `${name}` occurrence for which `resolve` returns a value.
/// Occurrences it declines are left untouched.
pub(crate) fn replace_placeholders<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&PlaceholderName) -> Option<String>,
{
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            PlaceholderName::parse(&caps[1])
                .ok()
                .and_then(|name| resolve(&name))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[PlaceholderName]) -> Vec<&str> {
        list.iter().map(PlaceholderName::as_str).collect()
    }

    #[test]
    fn parse_strips_both_surface_forms() {
        let a = PlaceholderName::parse("${client-name}").unwrap();
        let b = PlaceholderName::parse("{client-name}").unwrap();
        let c = PlaceholderName::parse("client-name").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.delimited(), "${client-name}");
    }

    #[test]
    fn parse_trims_inside_delimiters() {
        let key = PlaceholderName::parse("${ x }").unwrap();
        assert_eq!(key.as_str(), "x");
        assert_eq!(extract_str("see ${ x } here"), vec![key]);
        assert!(PlaceholderName::parse("{  }").is_err());
    }

    #[test]
    fn parse_is_case_sensitive() {
        let a = PlaceholderName::parse("Name").unwrap();
        let b = PlaceholderName::parse("name").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(PlaceholderName::parse("${}").is_err());
        assert!(PlaceholderName::parse("").is_err());
        assert!(PlaceholderName::parse("  ").is_err());
    }

    #[test]
    fn duplicates_extract_once() {
        let text = "Dear ${name}, ${name} and again ${name}.";
        assert_eq!(names(&extract_str(text)), vec!["name"]);
    }

    #[test]
    fn preserves_first_seen_order() {
        let text = "${b} then ${a} then ${b} then ${c}";
        assert_eq!(names(&extract_str(text)), vec!["b", "a", "c"]);
    }

    #[test]
    fn absent_or_empty_text_yields_nothing() {
        assert!(extract(None).is_empty());
        assert!(extract(Some("")).is_empty());
    }

    #[test]
    fn unbalanced_delimiters_are_ignored() {
        let text = "Broken ${open and {brace} and ${} and ${ok}";
        assert_eq!(names(&extract_str(text)), vec!["open and {brace", "ok"]);
        let text = "no closer ${never\n${fine}";
        assert_eq!(names(&extract_str(text)), vec!["fine"]);
    }
}
