use async_trait::async_trait;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};
use std::time::Duration;

/// A chat-completion backend.
///
/// Stage executors hold one of these behind an `Arc`, so tests can swap in
/// [`crate::llm::ScriptedLLM`].
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for LLM provider (renamed to avoid conflict with LLMProvider enum in types.rs)
#[derive(Debug, Clone)]
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    /// Override the provider's default endpoint
    pub base_url: Option<String>,
    pub timeout: Duration,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let kind = LLMProvider::from_id(&provider.name)
            .ok_or_else(|| AppError::Config(format!("Unsupported provider: {}", provider.name)))?;
        let base_url = provider.base_url.as_deref();

        let adapter: Box<dyn LLMAdapter> = match kind {
            LLMProvider::OpenAI => Box::new(crate::llm::openai::OpenAIAdapter::new_with_api_base(
                &provider.api_key,
                base_url.unwrap_or(crate::llm::openai::OPENAI_API_BASE),
                provider.timeout,
            )?),
            LLMProvider::Anthropic => Box::new(crate::llm::anthropic::AnthropicAdapter::new_with_api_base(
                &provider.api_key,
                base_url.unwrap_or(crate::llm::anthropic::ANTHROPIC_API_BASE),
                provider.timeout,
            )?),
            LLMProvider::Groq => Box::new(crate::llm::groq::GroqAdapter::new_with_api_base(
                &provider.api_key,
                base_url.unwrap_or(crate::llm::groq::GROQ_API_BASE),
                provider.timeout,
            )?),
            LLMProvider::OpenRouter => Box::new(crate::llm::openrouter::OpenRouterAdapter::new_with_api_base(
                &provider.api_key,
                base_url.unwrap_or(crate::llm::openrouter::OPENROUTER_API_BASE),
                provider.timeout,
            )?),
        };

        Ok(Self {
            adapter,
            provider_name: kind.to_string(),
        })
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

#[async_trait]
impl LLMAdapter for LLM {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}

/// Shared HTTP client construction for the adapters
pub(crate) fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}
