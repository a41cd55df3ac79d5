use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> OllamaChatRequest<'a> {
    /// Non-streaming chat body. JSON mode maps to `format: "json"`.
    fn from_request(request: &'a LlmRequest) -> Self {
        let system = (!request.system_prompt.is_empty()).then(|| OllamaMessage {
            role: "system",
            content: &request.system_prompt,
        });
        let user = OllamaMessage {
            role: "user",
            content: &request.user_prompt,
        };
        Self {
            model: local_model_name(&request.model),
            messages: system.into_iter().chain([user]).collect(),
            stream: false,
            format: request.json_response.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaReply,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaReply {
    content: String,
}

/// Strip a routing prefix such as "openai/" from a model id.
fn local_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = OllamaChatRequest::from_request(request);
        debug!(model = %body.model, json = request.json_response, "Sending request to Ollama");

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let reply: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(LlmResponse {
            content: reply.message.content,
            provider: self.name().to_string(),
            model: body.model.to_string(),
            tokens_used: reply.eval_count.unwrap_or(0) + reply.prompt_eval_count.unwrap_or(0),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(json_response: bool) -> LlmRequest {
        LlmRequest {
            model: "meta/llama3".to_string(),
            system_prompt: String::new(),
            user_prompt: "Clean up this letter".to_string(),
            max_tokens: 256,
            temperature: 0.2,
            json_response,
        }
    }

    #[test]
    fn strips_routing_prefix() {
        assert_eq!(local_model_name("openai/gpt-4o-mini"), "gpt-4o-mini");
        assert_eq!(local_model_name("llama3"), "llama3");
    }

    #[test]
    fn json_mode_sets_format() {
        let req = request(true);
        let body = serde_json::to_value(OllamaChatRequest::from_request(&req)).unwrap();
        assert_eq!(body["format"], "json");
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 256);
    }

    #[test]
    fn plain_mode_omits_format() {
        let req = request(false);
        let body = serde_json::to_value(OllamaChatRequest::from_request(&req)).unwrap();
        assert!(body.get("format").is_none());
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Clean up this letter"}]));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let provider = OllamaProvider::new().with_base_url("http://gpu-box:11434//");
        assert_eq!(provider.endpoint(), "http://gpu-box:11434/api/chat");
        assert_eq!(OllamaProvider::default().endpoint(), "http://localhost:11434/api/chat");
    }
}
