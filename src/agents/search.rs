//! Search Agent
//!
//! First pipeline stage. Gives the model the research tools and asks it to
//! return the relevant papers as JSON.

use super::executor::{ExecutorSettings, StageExecutor};
use crate::llm::LLMAdapter;
use crate::models::Paper;
use crate::parser::{parse_structured, ParseError};
use crate::tools::ToolSet;
use crate::types::AppResult;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const SYSTEM_PROMPT: &str = "You are an expert scientific literature researcher.

Find the papers most relevant to the user's topic.
1. {tool_guidance}
2. Only report papers that a tool actually returned. Never invent titles, authors or links.
3. Reply with the papers as JSON and nothing else.";

pub fn system_prompt(tools: &ToolSet) -> String {
    SYSTEM_PROMPT.replace("{tool_guidance}", &tools.guidance())
}

/// Either `[...]` or `{"papers": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PapersPayload {
    List(Vec<Paper>),
    Wrapped { papers: Vec<Paper> },
}

pub struct SearchAgent {
    executor: StageExecutor,
}

impl SearchAgent {
    pub fn new(llm: Arc<dyn LLMAdapter>, tools: ToolSet, settings: &ExecutorSettings) -> Self {
        Self {
            executor: StageExecutor::new(llm, settings, system_prompt(&tools)).with_tools(tools),
        }
    }

    /// Search for papers on `query`; an empty list means nothing relevant was found
    pub async fn find_papers(&self, query: &str) -> AppResult<Vec<Paper>> {
        info!(query = %query, tools = ?self.executor.tools().names(), "Starting literature search");

        let output = self.executor.run(&create_search_prompt(query)).await?;
        let papers = parse_papers(&output)?;

        info!(count = papers.len(), "Literature search completed");
        Ok(papers)
    }
}

fn create_search_prompt(query: &str) -> String {
    format!(
        r#"Research topic: {query}

Search the literature for this topic, then respond with a JSON array of the most relevant papers, wrapped in a ```json code block:

```json
[
  {{
    "title": "Paper title",
    "authors": ["First Author", "Second Author"],
    "url": "URL or DOI link",
    "summary": "Concise summary of the abstract or key findings"
  }}
]
```

If no relevant papers were found, respond with an empty array: []"#
    )
}

pub fn parse_papers(raw: &str) -> Result<Vec<Paper>, ParseError> {
    let payload: PapersPayload = parse_structured(raw)?;
    Ok(match payload {
        PapersPayload::List(papers) => papers,
        PapersPayload::Wrapped { papers } => papers,
    })
}
