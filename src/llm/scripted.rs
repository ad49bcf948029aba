//! Scripted LLM backend
//!
//! Replays a fixed queue of responses and records every request it receives,
//! so pipelines can run offline and deterministically.

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<LLMResponse>>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl ScriptedLLM {
    /// Responses are returned in order, one per call
    pub fn new(responses: impl IntoIterator<Item = LLMResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LLMAdapter for ScriptedLLM {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.requests
            .lock()
            .map_err(|_| AppError::LLMApi("scripted request log poisoned".to_string()))?
            .push(request.clone());

        self.responses
            .lock()
            .map_err(|_| AppError::LLMApi("scripted response queue poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| AppError::LLMApi("scripted responses exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "scripted".to_string(),
            messages: vec![LLMMessage::user("hello")],
            max_tokens: None,
            temperature: None,
            system_instruction: None,
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_errors() {
        let llm = ScriptedLLM::new(vec![LLMResponse::text("first"), LLMResponse::text("second")]);

        assert_eq!(llm.create_chat_completion(&request()).await.unwrap().content, "first");
        assert_eq!(llm.create_chat_completion(&request()).await.unwrap().content, "second");
        assert!(llm.create_chat_completion(&request()).await.is_err());
        assert_eq!(llm.call_count(), 3);
        assert_eq!(llm.remaining(), 0);
    }
}
