//! Fill unset config values with defaults.

use crate::schema::{
    DocfillConfig, EnrichmentConfig, GenerationConfig, LoggingConfig, ServerConfig,
};

pub const DEFAULT_PROVIDER: &str = "none";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_POLICY: &str = "literal";
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DocfillConfig) -> DocfillConfig {
    let config = apply_enrichment_defaults(config);
    let config = apply_generation_defaults(config);
    let config = apply_server_defaults(config);
    apply_logging_defaults(config)
}

fn apply_enrichment_defaults(mut config: DocfillConfig) -> DocfillConfig {
    let enrichment = config.enrichment.get_or_insert_with(EnrichmentConfig::default);
    enrichment
        .provider
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string());
    enrichment.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    enrichment.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    enrichment.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    config
}

fn apply_generation_defaults(mut config: DocfillConfig) -> DocfillConfig {
    let generation = config.generation.get_or_insert_with(GenerationConfig::default);
    generation
        .policy
        .get_or_insert_with(|| DEFAULT_POLICY.to_string());
    config
}

fn apply_server_defaults(mut config: DocfillConfig) -> DocfillConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    config
}

/// `dir` has no default here; the caller derives it from the config dir.
fn apply_logging_defaults(mut config: DocfillConfig) -> DocfillConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(DocfillConfig::default());
        let enrichment = cfg.enrichment.unwrap();
        assert_eq!(enrichment.provider.as_deref(), Some(DEFAULT_PROVIDER));
        assert_eq!(enrichment.max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(cfg.generation.unwrap().policy.as_deref(), Some("literal"));
        assert_eq!(cfg.server.unwrap().port, Some(DEFAULT_PORT));
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = DocfillConfig {
            enrichment: Some(EnrichmentConfig {
                provider: Some("ollama".to_string()),
                model: Some("llama3".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let enrichment = apply_all_defaults(cfg).enrichment.unwrap();
        assert_eq!(enrichment.provider.as_deref(), Some("ollama"));
        assert_eq!(enrichment.model.as_deref(), Some("llama3"));
        assert_eq!(enrichment.temperature, Some(DEFAULT_TEMPERATURE));
    }
}
