//! Stage Executor
//!
//! Binds one system prompt and an optional tool set to an injected model.
//! With tools, the model may ask for any number of tool calls before it
//! answers; every result is appended to the conversation and the model is
//! asked again, up to `max_iterations` model calls.

use crate::config::Config;
use crate::llm::LLMAdapter;
use crate::tools::ToolSet;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, ToolCall};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on model calls per stage
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// What the model wants next
#[derive(Debug, Clone, PartialEq)]
pub enum ModelAction {
    FinalAnswer(String),
    ToolCalls { preamble: String, calls: Vec<ToolCall> },
}

impl ModelAction {
    pub fn from_response(response: LLMResponse) -> Self {
        if response.tool_calls.is_empty() {
            ModelAction::FinalAnswer(response.content)
        } else {
            ModelAction::ToolCalls {
                preamble: response.content,
                calls: response.tool_calls,
            }
        }
    }
}

/// Model parameters shared by every stage of a run
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub model: String,
    pub max_iterations: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Fail the stage on a tool error instead of reporting it to the model
    pub fail_on_tool_error: bool,
}

impl ExecutorSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: None,
            temperature: None,
            fail_on_tool_error: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_iterations: config.agent.max_iterations,
            max_tokens: Some(config.llm.max_tokens),
            temperature: Some(config.llm.temperature),
            fail_on_tool_error: config.agent.fail_on_tool_error,
        }
    }
}

pub struct StageExecutor {
    llm: Arc<dyn LLMAdapter>,
    settings: ExecutorSettings,
    system_prompt: String,
    tools: ToolSet,
}

impl StageExecutor {
    pub fn new(llm: Arc<dyn LLMAdapter>, settings: &ExecutorSettings, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            settings: settings.clone(),
            system_prompt: system_prompt.into(),
            tools: ToolSet::new(),
        }
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Run the prompt to a final text answer
    pub async fn run(&self, prompt: &str) -> AppResult<String> {
        let mut messages = vec![LLMMessage::user(prompt)];
        let definitions = self.tools.definitions();

        for iteration in 1..=self.settings.max_iterations {
            let request = LLMRequest {
                model: self.settings.model.clone(),
                messages: messages.clone(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                system_instruction: Some(self.system_prompt.clone()),
                tools: definitions.clone(),
            };

            let response = self.llm.create_chat_completion(&request).await?;
            debug!(
                iteration,
                finish_reason = %response.finish_reason,
                total_tokens = response.usage.total_tokens,
                "Model responded"
            );

            match ModelAction::from_response(response) {
                ModelAction::FinalAnswer(text) => {
                    info!(iteration, response_len = text.len(), "Stage produced final answer");
                    return Ok(text);
                }
                ModelAction::ToolCalls { preamble, calls } => {
                    if self.tools.is_empty() {
                        // No tools were offered; only usable if the model also wrote an answer
                        if preamble.trim().is_empty() {
                            return Err(AppError::LLMApi(
                                "model requested tool calls but no tools are bound to this stage".to_string(),
                            ));
                        }
                        return Ok(preamble);
                    }

                    messages.push(LLMMessage::assistant_tool_calls(preamble, calls.clone()));
                    for call in &calls {
                        let result = self.invoke_tool(call).await?;
                        messages.push(LLMMessage::tool_result(call.id.clone(), result));
                    }
                }
            }
        }

        warn!(max_iterations = self.settings.max_iterations, "Tool-use loop hit its iteration cap");
        Err(AppError::IterationLimit(self.settings.max_iterations))
    }

    /// Tool failures go back to the model as text unless configured to fail the stage
    async fn invoke_tool(&self, call: &ToolCall) -> AppResult<String> {
        info!(tool = %call.name, arguments = %call.arguments, "Invoking tool");

        match self.tools.invoke_call(call).await {
            Ok(output) => Ok(output),
            Err(e) if self.settings.fail_on_tool_error => Err(e.into()),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                Ok(format!("Tool error: {}", e))
            }
        }
    }
}
