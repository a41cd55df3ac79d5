use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use docfill_core::{EnrichmentService, PlaceholderName, SuggestedPlaceholder};

use crate::parse::{parse_suggestions, strip_code_fence};
use crate::prompts;
use crate::providers::{LlmProvider, LlmRequest};

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// [`EnrichmentService`] backed by a chat-completion provider.
pub struct LlmEnrichment {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmEnrichment {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request(&self, system: &str, user: String, json_response: bool) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            system_prompt: system.to_string(),
            user_prompt: user,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            json_response,
        }
    }

    /// Send a document-rewriting request and return the cleaned body.
    async fn rewrite(&self, operation: &str, request: LlmRequest) -> Result<String> {
        let response = self.provider.complete(&request).await?;
        info!(
            provider = %response.provider,
            operation,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Enrichment call completed"
        );
        let body = strip_code_fence(&response.content);
        if body.is_empty() {
            bail!("{} returned an empty document for {}", response.provider, operation);
        }
        Ok(body.to_string())
    }
}

#[async_trait]
impl EnrichmentService for LlmEnrichment {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn suggest_placeholders(&self, text: &str) -> Result<Vec<SuggestedPlaceholder>> {
        let request = self.request(prompts::SUGGEST_SYSTEM, prompts::suggest_prompt(text), true);
        let response = self.provider.complete(&request).await?;
        let suggestions = parse_suggestions(&response.content);
        if suggestions.is_empty() {
            warn!(provider = %response.provider, "No usable placeholder suggestions");
        } else {
            debug!(count = suggestions.len(), "Parsed placeholder suggestions");
        }
        Ok(suggestions)
    }

    async fn insert_placeholders(&self, text: &str, names: &[PlaceholderName]) -> Result<String> {
        if names.is_empty() {
            return Ok(text.to_string());
        }
        let request = self.request(
            prompts::INSERT_SYSTEM,
            prompts::insert_prompt(text, names),
            false,
        );
        self.rewrite("insert_placeholders", request).await
    }

    async fn cleanup(&self, text: &str, values: &[(PlaceholderName, String)]) -> Result<String> {
        let request = self.request(
            prompts::CLEANUP_SYSTEM,
            prompts::cleanup_prompt(text, values),
            false,
        );
        self.rewrite("cleanup", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    fn name(raw: &str) -> PlaceholderName {
        PlaceholderName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn suggestions_request_json_and_parse() {
        let provider = Arc::new(MockProvider::new("mock").with_response(
            r#"{"suggested_placeholders": {"Jane Doe": "Full Name"}}"#,
        ));
        let service = LlmEnrichment::new(provider.clone()).with_model("test-model");

        let suggestions = service.suggest_placeholders("Dear Jane Doe").await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name.as_str(), "full-name");
        assert_eq!(suggestions[0].source_text, "Jane Doe");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_response);
        assert_eq!(requests[0].model, "test-model");
    }

    #[tokio::test]
    async fn malformed_suggestions_are_empty_not_errors() {
        let provider = Arc::new(MockProvider::new("mock").with_response("sorry, I can't"));
        let service = LlmEnrichment::new(provider);
        assert!(service.suggest_placeholders("text").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_an_error() {
        let provider = Arc::new(MockProvider::new("mock").failing("connection refused"));
        let service = LlmEnrichment::new(provider);
        assert!(service.suggest_placeholders("text").await.is_err());
        assert!(service.cleanup("text", &[]).await.is_err());
    }

    #[tokio::test]
    async fn insert_strips_fences() {
        let provider = Arc::new(
            MockProvider::new("mock").with_response("```markdown\nDear ${full-name}\n```"),
        );
        let service = LlmEnrichment::new(provider.clone());
        let out = service
            .insert_placeholders("Dear Jane", &[name("full-name")])
            .await
            .unwrap();
        assert_eq!(out, "Dear ${full-name}");
        assert!(!provider.requests()[0].json_response);
    }

    #[tokio::test]
    async fn insert_without_names_skips_the_provider() {
        let provider = Arc::new(MockProvider::new("mock"));
        let service = LlmEnrichment::new(provider.clone());
        let out = service.insert_placeholders("unchanged", &[]).await.unwrap();
        assert_eq!(out, "unchanged");
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn blank_cleanup_output_is_an_error() {
        let provider = Arc::new(MockProvider::new("mock").with_response("   "));
        let service = LlmEnrichment::new(provider);
        let values = vec![(name("a"), "x".to_string())];
        assert!(service.cleanup("${a}", &values).await.is_err());
    }
}
