use std::path::PathBuf;

use thiserror::Error;

use crate::placeholder::PlaceholderName;

/// Top-level error type for docfill operations.
#[derive(Debug, Error)]
pub enum DocfillError {
    #[error("invalid placeholder name: {0:?}")]
    InvalidName(String),

    #[error("unknown placeholder: {0}")]
    UnknownPlaceholder(PlaceholderName),

    #[error("placeholder already exists: {0}")]
    DuplicateName(PlaceholderName),

    #[error("invalid dependency for '{name}': {reason}")]
    InvalidDependency {
        name: PlaceholderName,
        reason: String,
    },

    #[error("value for '{name}' does not match field type {expected}")]
    TypeMismatch {
        name: PlaceholderName,
        expected: String,
    },

    #[error("'{value}' is not an allowed option for '{name}'")]
    InvalidOption { name: PlaceholderName, value: String },

    #[error("please fill in all required fields: {}", join_names(.missing))]
    ValidationFailed { missing: Vec<PlaceholderName> },

    #[error("optional fields left empty, confirmation required: {}", join_names(.fields))]
    EmptyFieldsUnconfirmed { fields: Vec<PlaceholderName> },

    #[error("enrichment service error: {0}")]
    EnrichmentServiceError(String),

    #[error("template document not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("template artifact error: {0}")]
    ArtifactError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DocfillError>;

fn join_names(names: &[PlaceholderName]) -> String {
    names
        .iter()
        .map(PlaceholderName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failed_lists_names() {
        let err = DocfillError::ValidationFailed {
            missing: vec![
                PlaceholderName::parse("full-name").unwrap(),
                PlaceholderName::parse("children-names").unwrap(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "please fill in all required fields: full-name, children-names"
        );
    }
}
