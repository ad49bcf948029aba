//! Writer Agent
//!
//! Final pipeline stage. The model writes the report body; the references
//! section is rendered here from the papers so links are never paraphrased.

use super::executor::{ExecutorSettings, StageExecutor};
use crate::llm::LLMAdapter;
use crate::models::Paper;
use crate::types::AppResult;
use std::sync::Arc;
use tracing::info;

pub const SYSTEM_PROMPT: &str = "You are a scientific writer producing research reports.

Write clear, well-structured prose for a scientifically literate reader. \
Do not add a references section; it is appended separately.";

pub struct WriterAgent {
    executor: StageExecutor,
}

impl WriterAgent {
    pub fn new(llm: Arc<dyn LLMAdapter>, settings: &ExecutorSettings) -> Self {
        Self {
            executor: StageExecutor::new(llm, settings, SYSTEM_PROMPT),
        }
    }

    /// Write the final report: model-written body followed by the references
    pub async fn write_report(
        &self,
        query: &str,
        analysis: &str,
        critique: &str,
        papers: &[Paper],
    ) -> AppResult<String> {
        info!(query = %query, paper_count = papers.len(), "Writing report");

        let prompt = format!(
            "Research topic: {}\n\nAnalysis:\n{}\n\nCritique:\n{}\n\n\
             Write the report with these sections:\n\
             ## Summary\n## Key Findings\n## Open Questions & Future Directions",
            query, analysis, critique
        );
        let body = self.executor.run(&prompt).await?;

        Ok(format!("{}\n\n{}", body.trim_end(), render_references(papers)))
    }
}

/// Numbered references section built from the papers
pub fn render_references(papers: &[Paper]) -> String {
    let mut out = String::from("## References\n");

    if papers.is_empty() {
        out.push_str("\nNo references were found.\n");
        return out;
    }

    for (i, paper) in papers.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, paper.title));
        if !paper.authors.is_empty() {
            out.push_str(&format!("   Authors: {}\n", paper.authors.join(", ")));
        }
        out.push_str(&format!("   Link: {}\n", paper.url));
        out.push_str(&format!("   Summary: {}\n", paper.summary));
    }
    out
}
