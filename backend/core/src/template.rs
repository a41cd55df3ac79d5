//! The persisted template artifact exchanged between the configuration stage
//! and the form-filling stage.
//!
//! Shape: `{"placeholders": {"<name>": {"type", "required", "is_conditional",
//! "dependent_on"}}}`. Keys may carry `${}` delimiters; they are normalized
//! on load. Entry order is preserved in both directions.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::fs;
use tracing::info;

use crate::error::{DocfillError, Result};
use crate::field::FieldConfig;
use crate::placeholder::PlaceholderName;
use crate::registry::Registry;

/// A finalized registry. Read-only; use [`Template::into_registry`] to edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(
        serialize_with = "serialize_registry",
        deserialize_with = "deserialize_registry"
    )]
    placeholders: Registry,
}

impl Registry {
    /// Freeze the registry for form consumption.
    pub fn finalize(self) -> Template {
        Template { placeholders: self }
    }
}

impl Template {
    pub fn registry(&self) -> &Registry {
        &self.placeholders
    }

    pub fn into_registry(self) -> Registry {
        self.placeholders
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let template: Template =
            serde_json::from_str(raw).map_err(|e| DocfillError::ArtifactError(e.to_string()))?;
        template.placeholders.check_all()?;
        Ok(template)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DocfillError::ArtifactError(e.to_string()))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(DocfillError::TemplateMissing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        let template = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            placeholders = template.placeholders.len(),
            "Loaded template"
        );
        Ok(template)
    }

    /// Write atomically (temp file, then rename).
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = self.to_json()?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json.as_bytes())
            .await
            .with_context(|| format!("Failed to write temp template: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("Failed to rename temp template to: {}", path.display()))?;
        info!(path = %path.display(), "Saved template");
        Ok(())
    }
}

fn serialize_registry<S: Serializer>(
    registry: &Registry,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(registry.len()))?;
    for (name, config) in registry.iter() {
        map.serialize_entry(name, config)?;
    }
    map.end()
}

fn deserialize_registry<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Registry, D::Error> {
    struct RegistryVisitor;

    impl<'de> Visitor<'de> for RegistryVisitor {
        type Value = Registry;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of placeholder names to field configurations")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Registry, A::Error> {
            let mut entries: Vec<(PlaceholderName, FieldConfig)> = Vec::new();
            while let Some((name, config)) = access.next_entry::<PlaceholderName, FieldConfig>()? {
                if entries.iter().any(|(n, _)| *n == name) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate placeholder '{name}'"
                    )));
                }
                entries.push((name, config));
            }
            Ok(Registry::from_entries(entries))
        }
    }

    deserializer.deserialize_map(RegistryVisitor)
}
