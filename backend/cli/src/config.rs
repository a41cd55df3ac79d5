//! Runtime settings for the CLI, resolved from `docfill.yaml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use docfill_config::{config_dir, config_file_path, prepare, ConfigValidationError, DocfillConfig};
use docfill_core::{EnrichmentService, GenerationPolicy, Generator};
use docfill_enrich::{LlmEnrichment, OllamaProvider, OpenRouterProvider, ProviderRegistry};

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `docfill.yaml` and, by default, `logs/`.
    pub dir: PathBuf,
    /// Prepared file config: env vars substituted, defaults applied.
    pub file: DocfillConfig,
    /// Validation warnings, held until the logger is installed.
    pub warnings: Vec<ConfigValidationError>,
}

impl Config {
    /// Load from an explicit file, or from `docfill.yaml` in the config dir.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (dir, path) = match path {
            Some(p) => (
                p.parent().map(Path::to_path_buf).unwrap_or_default(),
                p.to_path_buf(),
            ),
            None => {
                let dir = config_dir();
                let path = config_file_path(&dir);
                (dir, path)
            }
        };
        let (file, warnings) = prepare(&path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Ok(Self {
            dir,
            file,
            warnings,
        })
    }

    /// Defaults only, rooted at `dir`.
    #[cfg(test)]
    pub fn with_defaults(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file: docfill_config::apply_all_defaults(DocfillConfig::default()),
            warnings: Vec::new(),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.file
            .logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.dir.join("logs"))
    }

    pub fn log_level(&self) -> &str {
        self.file
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(docfill_config::defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn log_json(&self) -> bool {
        self.file
            .logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    pub fn bind_address(&self) -> &str {
        self.file
            .server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(docfill_config::defaults::DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.file
            .server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(docfill_config::defaults::DEFAULT_PORT)
    }

    pub fn policy(&self) -> Result<GenerationPolicy> {
        let raw = self
            .file
            .generation
            .as_ref()
            .and_then(|g| g.policy.as_deref())
            .unwrap_or(docfill_config::defaults::DEFAULT_POLICY);
        raw.parse().map_err(anyhow::Error::msg)
    }

    /// The configured enrichment service, or `None` for provider "none".
    pub fn enrichment(&self) -> Option<Arc<dyn EnrichmentService>> {
        let settings = self.file.enrichment.clone().unwrap_or_default();
        let selected = settings.provider.as_deref().unwrap_or("none");
        if selected == "none" {
            return None;
        }

        let mut registry = ProviderRegistry::new();
        if let Some(api_key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut provider = OpenRouterProvider::new(api_key);
            if selected == "openrouter" {
                if let Some(url) = &settings.base_url {
                    provider = provider.with_base_url(url);
                }
            }
            registry.register(Arc::new(provider));
        }
        let mut ollama = OllamaProvider::new();
        if selected == "ollama" {
            if let Some(url) = &settings.base_url {
                ollama = ollama.with_base_url(url);
            }
        }
        registry.register(Arc::new(ollama));

        let Some(provider) = registry.get(selected) else {
            warn!(
                provider = selected,
                available = ?registry.list(),
                "Enrichment provider unavailable; continuing without it"
            );
            return None;
        };

        let mut service = LlmEnrichment::new(provider);
        if let Some(model) = settings.model {
            service = service.with_model(model);
        }
        if let Some(max_tokens) = settings.max_tokens {
            service = service.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = settings.temperature {
            service = service.with_temperature(temperature);
        }
        info!(provider = selected, "Enrichment service configured");
        Some(Arc::new(service))
    }

    pub fn generator(&self, policy: Option<GenerationPolicy>) -> Result<Generator> {
        let policy = match policy {
            Some(p) => p,
            None => self.policy()?,
        };
        let generator = Generator::new(policy);
        Ok(match self.enrichment() {
            Some(service) => generator.with_enrichment(service),
            None => generator,
        })
    }
}
