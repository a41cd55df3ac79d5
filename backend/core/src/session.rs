//! Form session: the values one consumer has entered against a template.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DocfillError, Result};
use crate::evaluator::{field_states, FieldState};
use crate::field::FieldConfig;
use crate::placeholder::PlaceholderName;
use crate::template::Template;
use crate::validator::{validate, ValidationReport};
use crate::value::{FieldValue, ValueMap};

/// Values entered for one template, owned by a single interaction.
#[derive(Debug, Clone)]
pub struct FormSession {
    template: Arc<Template>,
    values: ValueMap,
}

impl FormSession {
    /// Start with every field unset.
    pub fn new(template: Arc<Template>) -> Self {
        debug!(fields = template.registry().len(), "Form session started");
        Self {
            template,
            values: ValueMap::new(),
        }
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// Switch to another template. Values are cleared when the set of
    /// placeholder names differs and kept otherwise.
    pub fn rebind(&mut self, template: Arc<Template>) {
        let same_keys = {
            let old = self.template.registry();
            let new = template.registry();
            old.len() == new.len() && old.names().all(|n| new.contains(n))
        };
        if !same_keys {
            info!("Placeholder set changed; resetting form values");
            self.values = ValueMap::new();
        }
        self.template = template;
    }

    fn config(&self, name: &PlaceholderName) -> Result<&FieldConfig> {
        self.template
            .registry()
            .get(name)
            .ok_or_else(|| DocfillError::UnknownPlaceholder(name.clone()))
    }

    pub fn get(&self, name: &PlaceholderName) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &PlaceholderName, value: FieldValue) -> Result<()> {
        value.check(name, self.config(name)?)?;
        self.values.insert(name.clone(), value);
        Ok(())
    }

    /// Set from a JSON value, coerced by the field type. `null` clears.
    pub fn set_json(&mut self, name: &PlaceholderName, value: &Value) -> Result<()> {
        match FieldValue::from_json(name, self.config(name)?, value)? {
            Some(value) => {
                self.values.insert(name.clone(), value);
            }
            None => {
                self.values.remove(name);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self, name: &PlaceholderName) -> Result<()> {
        self.config(name)?;
        self.values.remove(name);
        Ok(())
    }

    /// Apply a JSON object of `name: value` pairs. Keys may carry `${}`.
    ///
    /// Stops at the first bad entry; entries applied before it are kept.
    pub fn apply_json(&mut self, object: &serde_json::Map<String, Value>) -> Result<()> {
        for (raw, value) in object {
            let name = PlaceholderName::parse(raw)?;
            self.set_json(&name, value)?;
        }
        Ok(())
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn snapshot(&self) -> ValueMap {
        self.values.clone()
    }

    pub fn field_states(&self) -> Vec<FieldState> {
        field_states(self.template.registry(), &self.values)
    }

    pub fn validate(&self) -> ValidationReport {
        validate(self.template.registry(), &self.values)
    }
}
