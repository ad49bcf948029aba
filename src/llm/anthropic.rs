// Anthropic Messages API adapter
// Tool calls map to `tool_use` blocks; tool results go back as `tool_result` blocks in a user turn.

use crate::llm::provider::{http_client, LLMAdapter};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, TokenUsage, ToolCall};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
// The Messages API requires max_tokens on every request
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    api_base: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicAdapter {
    pub fn new(api_key: &str, timeout: Duration) -> AppResult<Self> {
        Self::new_with_api_base(api_key, ANTHROPIC_API_BASE, timeout)
    }

    pub fn new_with_api_base(api_key: &str, api_base: &str, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Split out system text and merge consecutive tool results into one user turn
    fn convert_messages(
        system_instruction: Option<&str>,
        messages: &[LLMMessage],
    ) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts: Vec<String> = system_instruction.map(str::to_string).into_iter().collect();
        let mut converted: Vec<AnthropicMessage> = Vec::new();

        for msg in messages {
            match msg.role.as_str() {
                "system" => system_parts.push(msg.content.clone()),
                "assistant" => {
                    let mut content = Vec::new();
                    if !msg.content.is_empty() {
                        content.push(ContentBlock::Text { text: msg.content.clone() });
                    }
                    content.extend(msg.tool_calls.iter().map(|call| ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    }));
                    converted.push(AnthropicMessage { role: "assistant", content });
                }
                "tool" => {
                    let block = ContentBlock::ToolResult {
                        tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone(),
                    };
                    match converted.last_mut() {
                        Some(last)
                            if last.role == "user"
                                && last.content.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
                        {
                            last.content.push(block)
                        }
                        _ => converted.push(AnthropicMessage { role: "user", content: vec![block] }),
                    }
                }
                _ => converted.push(AnthropicMessage {
                    role: "user",
                    content: vec![ContentBlock::Text { text: msg.content.clone() }],
                }),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, converted)
    }
}

#[async_trait]
impl LLMAdapter for AnthropicAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/v1/messages", self.api_base);
        let (system, messages) =
            Self::convert_messages(request.system_instruction.as_deref(), &request.messages);

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
            temperature: request.temperature,
            tools: request
                .tools
                .iter()
                .map(|tool| AnthropicTool {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    input_schema: tool.parameters.clone(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(AppError::LLMApi(format!(
                    "Anthropic API error ({}): {}",
                    status, error_response.error.message
                )));
            }
            return Err(AppError::LLMApi(format!("Anthropic API error ({}): {}", status, error_text)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Anthropic response: {}", e)))?;

        let mut text = Vec::new();
        let mut tool_calls = Vec::new();
        for block in parsed.content {
            match block {
                ContentBlock::Text { text: t } => text.push(t),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall::new(id, name, input)),
                _ => {}
            }
        }

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content: text.join("\n"),
            finish_reason: parsed.stop_reason.unwrap_or_else(|| "end_turn".to_string()),
            usage,
            tool_calls,
        })
    }
}
