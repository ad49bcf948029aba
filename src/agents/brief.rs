//! Brief Agent
//!
//! Single-shot mode: one tool-using model call that must answer with a
//! complete [`ScientificResearchResponse`] as JSON.

use super::executor::{ExecutorSettings, StageExecutor};
use super::writer::render_references;
use crate::llm::LLMAdapter;
use crate::models::ScientificResearchResponse;
use crate::parser::parse_structured;
use crate::tools::ToolSet;
use crate::types::{AppError, AppResult};
use std::sync::Arc;
use tracing::info;

const INSTRUCTIONS: &str = "You are an expert scientific research assistant. Your goal is to conduct thorough literature reviews.

1. {tool_guidance}
2. Do not simply return a list of summaries. Synthesize the information from multiple papers into a coherent, well-structured summary of the current state of research on the topic.
3. Identify the key findings, methodologies and conclusions. If sources conflict, point this out.
4. A crucial part of your role is to identify what is *not* known. Based on the literature, list the open questions or areas that require further research.
5. Wrap your final response in the JSON format below. Do not provide any other text or explanation.";

const FORMAT_INSTRUCTIONS: &str = r#"The output must be a JSON object with exactly these fields:

```json
{
  "topic": "The primary research topic.",
  "summary": "A detailed synthesis of the findings from all sources, including methodologies and conclusions.",
  "key_papers": [
    {
      "title": "The title of the research paper.",
      "authors": ["The list of authors of the paper."],
      "url": "The URL or DOI link to the paper.",
      "summary": "A concise summary of the paper's abstract or key findings."
    }
  ],
  "unanswered_questions": ["Open questions or areas for future research identified from the literature."],
  "tools_used": ["The names of the tools used to produce this response."]
}
```"#;

/// Instructions plus output schema; tool advice follows the bound tools
pub fn system_prompt(tools: &ToolSet) -> String {
    format!(
        "{}\n\n{}",
        INSTRUCTIONS.replace("{tool_guidance}", &tools.guidance()),
        FORMAT_INSTRUCTIONS
    )
}

pub struct BriefAgent {
    executor: StageExecutor,
}

impl BriefAgent {
    pub fn new(llm: Arc<dyn LLMAdapter>, tools: ToolSet, settings: &ExecutorSettings) -> Self {
        Self {
            executor: StageExecutor::new(llm, settings, system_prompt(&tools)).with_tools(tools),
        }
    }

    /// Returns `AppError::Parse` with the raw model output when the answer
    /// does not match the schema.
    pub async fn run(&self, query: &str) -> AppResult<ScientificResearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("Query must not be empty".to_string()));
        }

        info!(query = %query, "Starting brief research");
        let output = self.executor.run(query).await?;
        let response: ScientificResearchResponse = parse_structured(&output)?;

        info!(
            paper_count = response.key_papers.len(),
            tools_used = ?response.tools_used,
            "Brief research completed"
        );
        Ok(response)
    }
}

/// Render a brief response in the report layout
pub fn render_response(response: &ScientificResearchResponse) -> String {
    let mut out = format!("# {}\n\n## Summary\n\n{}\n\n", response.topic, response.summary.trim());

    out.push_str("## Open Questions & Future Directions\n\n");
    if response.unanswered_questions.is_empty() {
        out.push_str("None identified.\n");
    }
    for question in &response.unanswered_questions {
        out.push_str(&format!("- {}\n", question));
    }

    out.push('\n');
    out.push_str(&render_references(&response.key_papers));

    if !response.tools_used.is_empty() {
        out.push_str(&format!("\nTools used: {}\n", response.tools_used.join(", ")));
    }
    out
}
