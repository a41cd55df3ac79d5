//! Config validation with field paths in every message.

use crate::schema::DocfillConfig;
use thiserror::Error;

pub const PROVIDERS: &[&str] = &["openrouter", "ollama", "none"];
pub const POLICIES: &[&str] = &["literal", "cleanup"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &DocfillConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_enrichment(config, &mut report);
    validate_generation(config, &mut report);
    validate_server(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_enrichment(config: &DocfillConfig, report: &mut ValidationReport) {
    let Some(enrichment) = &config.enrichment else { return };

    if let Some(provider) = &enrichment.provider {
        if !PROVIDERS.contains(&provider.as_str()) {
            report.error(
                "enrichment.provider",
                format!("Unknown provider '{provider}'. Use 'openrouter', 'ollama', or 'none'"),
            );
        }
        if provider == "openrouter"
            && enrichment.api_key.as_deref().map(str::is_empty).unwrap_or(true)
        {
            report.error("enrichment.apiKey", "OpenRouter requires an API key");
        }
    }

    if enrichment.max_tokens == Some(0) {
        report.error("enrichment.maxTokens", "maxTokens must be >= 1");
    }

    if let Some(t) = enrichment.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("enrichment.temperature", "temperature must be between 0 and 2");
        }
    }
}

fn validate_generation(config: &DocfillConfig, report: &mut ValidationReport) {
    let Some(policy) = config.generation.as_ref().and_then(|g| g.policy.as_deref()) else {
        return;
    };
    if !POLICIES.contains(&policy) {
        report.error(
            "generation.policy",
            format!("Unknown policy '{policy}'. Use 'literal' or 'cleanup'"),
        );
        return;
    }

    let provider = config
        .enrichment
        .as_ref()
        .and_then(|e| e.provider.as_deref())
        .unwrap_or("none");
    if policy == "cleanup" && provider == "none" {
        report.warn(
            "generation.policy",
            "cleanup needs an enrichment provider; generation will fall back to literal",
        );
    }
}

fn validate_server(config: &DocfillConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    match server.port {
        Some(0) => report.error("server.port", "port must be > 0"),
        Some(port) if port < 1024 => report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        ),
        _ => {}
    }
    if server.bind.as_deref().map(str::trim) == Some("") {
        report.error("server.bind", "bind address cannot be empty");
    }
}

fn validate_logging(config: &DocfillConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else {
        return;
    };
    // Directives like "docfill_core=debug" are passed through to EnvFilter.
    if !level.contains('=') && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn("logging.level", format!("Unrecognized log level '{level}'"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{EnrichmentConfig, GenerationConfig, ServerConfig};

    #[test]
    fn defaults_are_valid() {
        let report = validate(&apply_all_defaults(DocfillConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn openrouter_without_key_is_error() {
        let cfg = DocfillConfig {
            enrichment: Some(EnrichmentConfig {
                provider: Some("openrouter".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "enrichment.apiKey");
    }

    #[test]
    fn unknown_provider_and_policy_are_errors() {
        let cfg = DocfillConfig {
            enrichment: Some(EnrichmentConfig {
                provider: Some("gpt".to_string()),
                ..Default::default()
            }),
            generation: Some(GenerationConfig {
                policy: Some("fancy".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(validate(&cfg).errors.len(), 2);
    }

    #[test]
    fn cleanup_without_provider_warns() {
        let cfg = DocfillConfig {
            generation: Some(GenerationConfig {
                policy: Some("cleanup".to_string()),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "generation.policy");
    }

    #[test]
    fn privileged_port_warns() {
        let cfg = DocfillConfig {
            server: Some(ServerConfig {
                bind: None,
                port: Some(80),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
