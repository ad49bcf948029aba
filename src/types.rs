// Type definitions shared by the LLM adapters, tools and agents

use crate::models::PipelineStage;
use crate::parser::ParseError;
use crate::tools::ToolError;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum LLMProvider {
    OpenAI,
    Anthropic,
    Groq,
    OpenRouter,
}

impl LLMProvider {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "openai" => Some(LLMProvider::OpenAI),
            "anthropic" => Some(LLMProvider::Anthropic),
            "groq" => Some(LLMProvider::Groq),
            "openrouter" => Some(LLMProvider::OpenRouter),
            _ => None,
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "OPENAI_API_KEY",
            LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
            LLMProvider::Groq => "GROQ_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Function definition advertised to the model's tool-selection mechanism
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system", "tool"
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl LLMMessage {
    /// Create a new message with text content
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Assistant turn that requested one or more tool calls
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new("assistant", content)
        }
    }

    /// Result of a tool call, answered back to the model
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new("tool", content)
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl LLMResponse {
    /// Plain text answer with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
            tool_calls: Vec::new(),
        }
    }

    /// Response that only requests tool calls
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            finish_reason: "tool_calls".to_string(),
            usage: TokenUsage::default(),
            tool_calls,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool-use loop reached {0} iterations without a final answer")]
    IterationLimit(usize),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<AppError>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Unwrap stage context down to the error that actually occurred
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
