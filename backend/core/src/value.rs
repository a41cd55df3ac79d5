//! Form values and the value map they live in.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{DocfillError, Result};
use crate::field::{FieldConfig, FieldKind};
use crate::placeholder::PlaceholderName;

/// ISO date layout used for Date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A value entered for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
    List(Vec<String>),
}

impl FieldValue {
    /// Coerce a JSON value according to the field's configuration.
    ///
    /// `null` means "unset" and yields `Ok(None)`.
    pub fn from_json(
        name: &PlaceholderName,
        config: &FieldConfig,
        value: &Value,
    ) -> Result<Option<FieldValue>> {
        let mismatch = || DocfillError::TypeMismatch {
            name: name.clone(),
            expected: config.kind.to_string(),
        };

        let parsed = match (config.kind, value) {
            (_, Value::Null) => return Ok(None),
            (FieldKind::Text, Value::String(s)) => FieldValue::Text(s.clone()),
            (FieldKind::Dropdown, Value::String(s)) => FieldValue::Text(s.clone()),
            (FieldKind::Dropdown, Value::Array(items)) => FieldValue::List(
                items
                    .iter()
                    .map(|item| item.as_str().map(String::from).ok_or_else(mismatch))
                    .collect::<Result<_>>()?,
            ),
            (FieldKind::Number, Value::Number(n)) => {
                FieldValue::Number(n.as_f64().ok_or_else(mismatch)?)
            }
            (FieldKind::Number, Value::String(s)) => {
                FieldValue::Number(s.trim().parse().map_err(|_| mismatch())?)
            }
            (FieldKind::Date, Value::String(s)) => FieldValue::Date(
                NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| mismatch())?,
            ),
            (FieldKind::Checkbox, Value::Bool(b)) => FieldValue::Bool(*b),
            _ => return Err(mismatch()),
        };

        parsed.check_options(name, config)?;
        Ok(Some(parsed))
    }

    /// Reject values whose shape does not fit the field kind, and Dropdown
    /// choices outside the configured options.
    pub fn check(&self, name: &PlaceholderName, config: &FieldConfig) -> Result<()> {
        let fits = matches!(
            (config.kind, self),
            (FieldKind::Text, FieldValue::Text(_))
                | (FieldKind::Dropdown, FieldValue::Text(_) | FieldValue::List(_))
                | (FieldKind::Number, FieldValue::Number(_))
                | (FieldKind::Date, FieldValue::Date(_))
                | (FieldKind::Checkbox, FieldValue::Bool(_))
        );
        if !fits {
            return Err(DocfillError::TypeMismatch {
                name: name.clone(),
                expected: config.kind.to_string(),
            });
        }
        self.check_options(name, config)
    }

    fn check_options(&self, name: &PlaceholderName, config: &FieldConfig) -> Result<()> {
        if config.kind != FieldKind::Dropdown || config.options.is_empty() {
            return Ok(());
        }
        let chosen: Vec<&str> = match self {
            FieldValue::Text(s) if s.is_empty() => Vec::new(),
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        };
        match chosen.into_iter().find(|c| !config.options.iter().any(|o| o == c)) {
            Some(bad) => Err(DocfillError::InvalidOption {
                name: name.clone(),
                value: bad.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Text substituted into the generated document.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::Bool(true) => "Yes".to_string(),
            FieldValue::Bool(false) => "No".to_string(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Date(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Current values keyed by placeholder. A missing key means unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueMap(HashMap<PlaceholderName, FieldValue>);

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &PlaceholderName) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: PlaceholderName, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(name, value)
    }

    pub fn remove(&mut self, name: &PlaceholderName) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderName, &FieldValue)> {
        self.0.iter()
    }
}

impl FromIterator<(PlaceholderName, FieldValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (PlaceholderName, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
