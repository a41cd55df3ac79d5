//! LLM-backed placeholder suggestion, insertion and document cleanup.

pub mod parse;
pub mod prompts;
pub mod providers;
pub mod service;

pub use providers::mock::MockProvider;
pub use providers::ollama::OllamaProvider;
pub use providers::openrouter::OpenRouterProvider;
pub use providers::{LlmProvider, LlmRequest, LlmResponse, ProviderRegistry};
pub use service::LlmEnrichment;
