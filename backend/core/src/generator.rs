//! Document generator: turns a validated form into the final document.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document::Document;
use crate::enrichment::EnrichmentService;
use crate::error::{DocfillError, Result};
use crate::evaluator::is_visible;
use crate::placeholder::{replace_placeholders, PlaceholderName};
use crate::registry::Registry;
use crate::validator::validate;
use crate::value::{FieldValue, ValueMap};

/// How placeholders are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPolicy {
    /// Replace `${name}` with the value's display form; unset placeholders
    /// stay in the text.
    #[default]
    Literal,
    /// Ask the enrichment service to substitute values and drop content
    /// that depends on blank optional fields.
    Cleanup,
}

impl fmt::Display for GenerationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationPolicy::Literal => f.write_str("literal"),
            GenerationPolicy::Cleanup => f.write_str("cleanup"),
        }
    }
}

impl FromStr for GenerationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(GenerationPolicy::Literal),
            "cleanup" => Ok(GenerationPolicy::Cleanup),
            other => Err(format!("unknown generation policy '{other}'")),
        }
    }
}

/// Whether the caller confirmed generating with empty optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proceed {
    #[default]
    RequireConfirmation,
    WithEmptyFields,
}

/// Non-fatal problems encountered while generating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// The enrichment call failed; literal substitution was used instead.
    EnrichmentFallback { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    pub content: String,
    pub policy_used: GenerationPolicy,
    pub warnings: Vec<GenerationWarning>,
}

pub struct Generator {
    policy: GenerationPolicy,
    enrichment: Option<Arc<dyn EnrichmentService>>,
}

impl Generator {
    pub fn new(policy: GenerationPolicy) -> Self {
        Self {
            policy,
            enrichment: None,
        }
    }

    pub fn with_enrichment(mut self, service: Arc<dyn EnrichmentService>) -> Self {
        self.enrichment = Some(service);
        self
    }

    pub fn policy(&self) -> GenerationPolicy {
        self.policy
    }

    /// Produce the final document.
    ///
    /// Blocks on missing required fields, and on empty optional fields unless
    /// `proceed` confirms them. Enrichment failures only add a warning.
    pub async fn generate(
        &self,
        document: &Document,
        registry: &Registry,
        values: &ValueMap,
        proceed: Proceed,
    ) -> Result<Generated> {
        let report = validate(registry, values).into_result()?;
        if !report.empty_optional.is_empty() && proceed != Proceed::WithEmptyFields {
            return Err(DocfillError::EmptyFieldsUnconfirmed {
                fields: report.empty_optional,
            });
        }

        let generated = match self.policy {
            GenerationPolicy::Literal => Generated {
                content: substitute_visible(document.content(), registry, values),
                policy_used: GenerationPolicy::Literal,
                warnings: Vec::new(),
            },
            GenerationPolicy::Cleanup => match self.cleanup(document, registry, values).await {
                Ok(content) => Generated {
                    content,
                    policy_used: GenerationPolicy::Cleanup,
                    warnings: Vec::new(),
                },
                Err(e) => {
                    warn!(error = %e, "Cleanup failed; falling back to literal substitution");
                    Generated {
                        content: substitute_visible(document.content(), registry, values),
                        policy_used: GenerationPolicy::Literal,
                        warnings: vec![GenerationWarning::EnrichmentFallback {
                            message: e.to_string(),
                        }],
                    }
                }
            },
        };

        info!(
            policy = %generated.policy_used,
            warnings = generated.warnings.len(),
            bytes = generated.content.len(),
            "Document generated"
        );
        Ok(generated)
    }

    async fn cleanup(&self, document: &Document, registry: &Registry, values: &ValueMap) -> Result<String> {
        let service = self.enrichment.as_ref().ok_or_else(|| {
            DocfillError::EnrichmentServiceError("no enrichment service configured".to_string())
        })?;

        let display: Vec<(PlaceholderName, String)> = registry
            .names()
            .map(|name| {
                let shown = visible_value(registry, values, name)
                    .map(|v| v.display())
                    .unwrap_or_default();
                (name.clone(), shown)
            })
            .collect();

        let content = service
            .cleanup(document.content(), &display)
            .await
            .map_err(|e| DocfillError::EnrichmentServiceError(format!("{}: {e:#}", service.name())))?;

        if content.trim().is_empty() {
            return Err(DocfillError::EnrichmentServiceError(format!(
                "{} returned an empty document",
                service.name()
            )));
        }
        Ok(content)
    }
}

/// Literal substitution of every placeholder that has a value.
pub fn substitute(content: &str, values: &ValueMap) -> String {
    replace_placeholders(content, |name| values.get(name).map(|v| v.display()))
}

/// Values of hidden fields are ignored even if they were entered before the
/// field was hidden.
fn visible_value<'a>(
    registry: &Registry,
    values: &'a ValueMap,
    name: &PlaceholderName,
) -> Option<&'a FieldValue> {
    values.get(name).filter(|_| is_visible(registry, values, name))
}

/// Literal substitution restricted to fields that are currently shown.
/// Hidden placeholders stay in the text.
fn substitute_visible(content: &str, registry: &Registry, values: &ValueMap) -> String {
    replace_placeholders(content, |name| {
        visible_value(registry, values, name).map(|v| v.display())
    })
}
