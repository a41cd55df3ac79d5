//! Plain-text documents: paragraphs separated by a blank line.

use std::path::Path;

use anyhow::Context;
use tokio::fs;
use tracing::info;

use crate::error::{DocfillError, Result};

pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = paragraphs
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR);
        Self::new(joined)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content.split(PARAGRAPH_SEPARATOR)
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Read a source document; a missing file is `TemplateMissing`.
pub async fn load_document(path: &Path) -> Result<Document> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(DocfillError::TemplateMissing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "Loaded document");
    Ok(Document::new(content))
}

pub async fn write_document(path: &Path, document: &Document) -> Result<()> {
    fs::write(path, document.content().as_bytes())
        .await
        .with_context(|| format!("Failed to write document: {}", path.display()))?;
    info!(path = %path.display(), "Wrote document");
    Ok(())
}
