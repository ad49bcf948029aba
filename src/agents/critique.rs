//! Critique Agent
//!
//! Third pipeline stage. Reviews the analysis for gaps, contradictions and
//! open questions.

use super::executor::{ExecutorSettings, StageExecutor};
use crate::llm::LLMAdapter;
use crate::types::AppResult;
use std::sync::Arc;
use tracing::info;

pub const SYSTEM_PROMPT: &str = "You are a critical scientific reviewer.

A crucial part of your role is to identify what is *not* known. Point out weak evidence, \
contradictions between studies and methodological gaps, and list the open questions that \
need further research.";

pub struct CritiqueAgent {
    executor: StageExecutor,
}

impl CritiqueAgent {
    pub fn new(llm: Arc<dyn LLMAdapter>, settings: &ExecutorSettings) -> Self {
        Self {
            executor: StageExecutor::new(llm, settings, SYSTEM_PROMPT),
        }
    }

    pub async fn critique(&self, analysis: &str) -> AppResult<String> {
        info!(analysis_len = analysis.len(), "Critiquing analysis");
        self.executor
            .run(&format!(
                "Critique the following analysis. List its gaps, contradictions and open questions.\n\nAnalysis:\n{}",
                analysis
            ))
            .await
    }
}
