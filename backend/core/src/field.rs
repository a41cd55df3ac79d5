//! Field configuration: the per-placeholder settings chosen by the operator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::placeholder::PlaceholderName;

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Date,
    Dropdown,
    Checkbox,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Text,
        FieldKind::Number,
        FieldKind::Date,
        FieldKind::Dropdown,
        FieldKind::Checkbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::Number => "Number",
            FieldKind::Date => "Date",
            FieldKind::Dropdown => "Dropdown",
            FieldKind::Checkbox => "Checkbox",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field type '{s}'"))
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_else(|e| {
            warn!(kind = %raw, error = %e, "Falling back to Text field type");
            FieldKind::Text
        }))
    }
}

/// Configuration of one placeholder.
///
/// `dependent_on` is always present; an empty list means no dependency.
/// It only takes effect while `is_conditional` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_conditional: bool,
    #[serde(default, deserialize_with = "deserialize_dependencies")]
    pub dependent_on: Vec<PlaceholderName>,
    /// Allowed choices for Dropdown fields; empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldConfig {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Make the field conditional on every name in `parents`.
    pub fn depends_on<I>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = PlaceholderName>,
    {
        self.is_conditional = true;
        self.dependent_on = dedup(parents);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Dependencies that actually gate this field.
    pub fn active_dependencies(&self) -> &[PlaceholderName] {
        if self.is_conditional {
            &self.dependent_on
        } else {
            &[]
        }
    }
}

pub(crate) fn dedup<I>(names: I) -> Vec<PlaceholderName>
where
    I: IntoIterator<Item = PlaceholderName>,
{
    let mut out: Vec<PlaceholderName> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Accepts `null`, `"None"`, `""`, a single name, or a list of names.
fn deserialize_dependencies<'de, D>(deserializer: D) -> Result<Vec<PlaceholderName>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(serde::de::Error::custom(format!(
                    "dependency must be a string, got {other}"
                ))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(serde::de::Error::custom(format!(
                "dependent_on must be a name or list of names, got {other}"
            )))
        }
    };

    let names = raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "None")
        .map(PlaceholderName::parse)
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;
    Ok(dedup(names))
}
