//! `docfill-config`: runtime configuration for docfill.
//!
//! Provides:
//! - Typed config schema (enrichment, generation, server, logging)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with path-qualified messages

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{DocfillConfig, EnrichmentConfig, GenerationConfig, LoggingConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load a config file, substitute env vars, apply defaults and validate.
///
/// Validation errors fail the load; warnings are returned for the caller to
/// report once its logger is installed.
pub async fn prepare(path: &Path) -> Result<(DocfillConfig, Vec<ConfigValidationError>)> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: DocfillConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!(messages.join("; "));
    }
    Ok((config, report.warnings))
}

/// [`prepare`], logging warnings through tracing.
pub async fn load_and_prepare(path: &Path) -> Result<DocfillConfig> {
    let (config, warnings) = prepare(path).await?;
    log_warnings(&warnings);
    Ok(config)
}

pub fn log_warnings(warnings: &[ConfigValidationError]) {
    for warning in warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepares_missing_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_and_prepare(&config_file_path(dir.path())).await.unwrap();
        assert_eq!(
            cfg.enrichment.unwrap().provider.as_deref(),
            Some(defaults::DEFAULT_PROVIDER)
        );
    }

    #[tokio::test]
    async fn warnings_are_returned_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "server:\n  port: 80\n").await.unwrap();
        let (cfg, warnings) = prepare(&path).await.unwrap();
        assert_eq!(cfg.server.unwrap().port, Some(80));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "server.port");
    }

    #[tokio::test]
    async fn invalid_config_fails_to_prepare() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "generation:\n  policy: fancy\n").await.unwrap();
        let err = load_and_prepare(&path).await.unwrap_err().to_string();
        assert!(err.contains("generation.policy"));
    }
}
