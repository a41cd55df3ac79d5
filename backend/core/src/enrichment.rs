//! Boundary to the external text-transformation service.
//!
//! The service is never needed for correctness: callers treat every error
//! as recoverable and fall back to the literal path.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::placeholder::PlaceholderName;

/// A placeholder proposed by the enrichment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPlaceholder {
    /// Document text the suggestion was derived from.
    pub source_text: String,
    pub name: PlaceholderName,
}

impl SuggestedPlaceholder {
    pub fn new(source_text: impl Into<String>, name: PlaceholderName) -> Self {
        Self {
            source_text: source_text.into(),
            name,
        }
    }
}

#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// Service name for logs (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Propose additional placeholders for `text`.
    ///
    /// Implementations return an empty list for unusable responses.
    async fn suggest_placeholders(&self, text: &str) -> Result<Vec<SuggestedPlaceholder>>;

    /// Return `text` rewritten with `${name}` markers inserted for `names`.
    async fn insert_placeholders(&self, text: &str, names: &[PlaceholderName]) -> Result<String>;

    /// Substitute `values` into `text` and drop content that depends on
    /// placeholders left blank.
    async fn cleanup(&self, text: &str, values: &[(PlaceholderName, String)]) -> Result<String>;
}
