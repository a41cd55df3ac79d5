//! Form validation against the registry's effective requirements.

use serde::Serialize;
use tracing::debug;

use crate::error::{DocfillError, Result};
use crate::evaluator::{is_truthy, is_visible};
use crate::field::{FieldConfig, FieldKind};
use crate::placeholder::PlaceholderName;
use crate::registry::Registry;
use crate::value::{FieldValue, ValueMap};

/// Outcome of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Effectively required fields that are not filled, in registry order.
    pub missing: Vec<PlaceholderName>,
    /// Visible optional fields that are not filled.
    pub empty_optional: Vec<PlaceholderName>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn into_result(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(DocfillError::ValidationFailed {
                missing: self.missing,
            })
        }
    }
}

/// An explicitly set checkbox is an answer, even when unchecked.
fn is_answered_checkbox(config: &FieldConfig, value: Option<&FieldValue>) -> bool {
    config.kind == FieldKind::Checkbox && matches!(value, Some(FieldValue::Bool(_)))
}

/// Validate `values` against `registry`. Pure; values are never modified.
pub fn validate(registry: &Registry, values: &ValueMap) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (name, config) in registry.iter() {
        if !is_visible(registry, values, name) || is_truthy(values.get(name)) {
            continue;
        }
        if config.required {
            report.missing.push(name.clone());
        } else if !is_answered_checkbox(config, values.get(name)) {
            report.empty_optional.push(name.clone());
        }
    }
    debug!(
        missing = report.missing.len(),
        empty_optional = report.empty_optional.len(),
        "Validated form"
    );
    report
}
