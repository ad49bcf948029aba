// OpenRouter speaks the OpenAI chat-completions protocol

use crate::llm::{AppResult, LLMAdapter, LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::time::Duration;

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterAdapter {
    inner: crate::llm::openai::OpenAIAdapter,
}

impl OpenRouterAdapter {
    pub fn new(api_key: &str, timeout: Duration) -> AppResult<Self> {
        Self::new_with_api_base(api_key, OPENROUTER_API_BASE, timeout)
    }

    pub fn new_with_api_base(api_key: &str, api_base: &str, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            inner: crate::llm::openai::OpenAIAdapter::new_with_api_base(api_key, api_base, timeout)?,
        })
    }
}

#[async_trait]
impl LLMAdapter for OpenRouterAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.inner.create_chat_completion(request).await
    }
}
