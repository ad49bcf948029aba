//! Analysis Agent
//!
//! Second pipeline stage. Synthesizes the papers found by the search stage
//! into methodologies, key findings and conclusions.

use super::executor::{ExecutorSettings, StageExecutor};
use crate::llm::LLMAdapter;
use crate::models::Paper;
use crate::types::AppResult;
use std::sync::Arc;
use tracing::{info, warn};

/// Analysis text used when the search stage found nothing
pub const NO_PAPERS_SENTINEL: &str = "No relevant papers were found for this query, so no analysis could be performed.";

pub const SYSTEM_PROMPT: &str = "You are an expert scientific analyst.

Do not simply list the papers. Synthesize them into a coherent account of the current state of research:
identify the key findings, methodologies and conclusions, and point out where sources conflict.";

pub struct AnalysisAgent {
    executor: StageExecutor,
}

impl AnalysisAgent {
    pub fn new(llm: Arc<dyn LLMAdapter>, settings: &ExecutorSettings) -> Self {
        Self {
            executor: StageExecutor::new(llm, settings, SYSTEM_PROMPT),
        }
    }

    pub async fn analyze(&self, papers: &[Paper]) -> AppResult<String> {
        if papers.is_empty() {
            warn!("No papers to analyze");
            return Ok(NO_PAPERS_SENTINEL.to_string());
        }

        info!(paper_count = papers.len(), "Analyzing papers");
        self.executor.run(&create_analysis_prompt(papers)).await
    }
}

fn create_analysis_prompt(papers: &[Paper]) -> String {
    let mut prompt = String::from("Analyze the following papers.\n\n");

    for (i, paper) in papers.iter().enumerate() {
        prompt.push_str(&format!(
            "Paper {}:\nTitle: {}\nAuthors: {}\nLink: {}\nSummary: {}\n\n",
            i + 1,
            paper.title,
            paper.authors.join(", "),
            paper.url,
            paper.summary
        ));
    }

    prompt.push_str(
        "Describe the methodologies used, the key findings and the conclusions. \
         Note any conflicts between sources.",
    );
    prompt
}
