use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{LlmProvider, LlmRequest, LlmResponse};

/// A provider that returns a canned response, or fails on demand.
/// Every request it receives is recorded.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    failure: Option<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        if let Some(message) = &self.failure {
            bail!("{}: {}", self.name, message);
        }
        Ok(LlmResponse {
            content: self
                .fixed_response
                .clone()
                .unwrap_or_else(|| "Mock response".to_string()),
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
