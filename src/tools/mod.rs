//! Tool Adapter
//!
//! Every external information source is exposed to the model the same way:
//! a name, a description and `invoke(query) -> text`. The stage executor
//! looks tools up by name when the model asks for them.

pub mod builtin;

pub use builtin::{build_default_tools, ArxivTool, PubMedTool, StaticTool, WebSearchTool, WEB_SEARCH};

use crate::search::SearchError;
use crate::types::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} failed: {source}")]
    Search {
        tool: String,
        #[source]
        source: SearchError,
    },

    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

impl ToolError {
    pub fn search(tool: &str, source: SearchError) -> Self {
        ToolError::Search {
            tool: tool.to_string(),
            source,
        }
    }
}

/// An external query function the model may call during a stage
#[async_trait]
pub trait ResearchTool: Send + Sync {
    fn name(&self) -> &str;

    /// Shown to the model to help it pick the right tool
    fn description(&self) -> &str;

    async fn invoke(&self, query: &str) -> Result<String, ToolError>;

    /// Function definition with a single required `query` string
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

/// An ordered set of tools bound to a stage
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn ResearchTool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any existing tool with the same name
    pub fn with(mut self, tool: Arc<dyn ResearchTool>) -> Self {
        self.push(tool);
        self
    }

    pub fn push(&mut self, tool: Arc<dyn ResearchTool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ResearchTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// One sentence telling the model which of the bound tools to reach for first
    pub fn guidance(&self) -> String {
        let (web, academic): (Vec<String>, Vec<String>) =
            self.names().into_iter().partition(|name| name == WEB_SEARCH);
        let academic = academic
            .iter()
            .map(|name| format!("`{}`", name))
            .collect::<Vec<_>>()
            .join(", ");

        match (academic.is_empty(), web.is_empty()) {
            (false, false) => format!(
                "Always prefer academic sources. Use {} first. Use `{}` only as a last resort for very recent or non-academic topics.",
                academic, WEB_SEARCH
            ),
            (false, true) => format!("Use {} to find academic sources.", academic),
            (true, false) => format!("Use `{}` to find sources.", WEB_SEARCH),
            (true, true) => "No search tools are available; work only from what you already know.".to_string(),
        }
    }

    /// Resolve a model tool call and run it
    pub async fn invoke_call(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        let query = query_argument(&call.name, &call.arguments)?;
        tool.invoke(&query).await
    }
}

/// Accepts `{"query": "..."}` or a bare string
fn query_argument(tool: &str, arguments: &Value) -> Result<String, ToolError> {
    let query = match arguments {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("query").and_then(|v| v.as_str()),
        _ => None,
    };

    query
        .map(|q| q.trim().to_string())
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("expected a string `query`, got {}", arguments),
        })
}
