use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenRouter (or any OpenAI-compatible chat completions endpoint).
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    /// The system prompt is omitted when empty; JSON mode maps to
    /// `response_format: {"type": "json_object"}`.
    fn from_request(request: &'a LlmRequest) -> Self {
        let system = (!request.system_prompt.is_empty()).then(|| ChatMessage {
            role: "system",
            content: &request.system_prompt,
        });
        let user = ChatMessage {
            role: "user",
            content: &request.user_prompt,
        };
        Self {
            model: &request.model,
            messages: system.into_iter().chain([user]).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

impl ChatResponse {
    /// First choice text and total token count. A reply with no choices or
    /// a null content is an error.
    fn into_parts(self) -> Result<(String, u64)> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("OpenRouter reply contained no message content"))?;
        let tokens = self.usage.and_then(|u| u.total_tokens).unwrap_or(0);
        Ok((content, tokens))
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = ChatRequest::from_request(request);
        debug!(model = %request.model, json = request.json_response, "Sending request to OpenRouter");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenRouter HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter returned {}: {}", status, error_body);
        }

        let (content, tokens_used) = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse OpenRouter response")?
            .into_parts()?;

        Ok(LlmResponse {
            content,
            provider: self.name().to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
