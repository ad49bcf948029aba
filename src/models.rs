// Core research data models

use serde::{Deserialize, Serialize};

/// A source found by the search stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    /// URL or DOI link
    pub url: String,
    pub summary: String,
}

/// Accumulated state of one pipeline run.
///
/// Created with only `query` set. Each stage fills exactly one further field
/// and never clears what earlier stages wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchState {
    pub query: String,
    pub papers: Vec<Paper>,
    pub analysis: String,
    pub critique: String,
    pub report: String,
}

impl ResearchState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Output schema of the single-shot brief mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScientificResearchResponse {
    pub topic: String,
    pub summary: String,
    pub key_papers: Vec<Paper>,
    pub unanswered_questions: Vec<String>,
    pub tools_used: Vec<String>,
}

/// The four fixed stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Search,
    Analyze,
    Critique,
    Write,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Search,
        PipelineStage::Analyze,
        PipelineStage::Critique,
        PipelineStage::Write,
    ];

    /// 1-based position in the pipeline
    pub fn position(&self) -> usize {
        match self {
            PipelineStage::Search => 1,
            PipelineStage::Analyze => 2,
            PipelineStage::Critique => 3,
            PipelineStage::Write => 4,
        }
    }

    /// Progress label shown while the stage runs
    pub fn activity(&self) -> &'static str {
        match self {
            PipelineStage::Search => "Searching literature",
            PipelineStage::Analyze => "Analyzing papers",
            PipelineStage::Critique => "Critiquing analysis",
            PipelineStage::Write => "Writing report",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Search => write!(f, "Search"),
            PipelineStage::Analyze => write!(f, "Analyze"),
            PipelineStage::Critique => write!(f, "Critique"),
            PipelineStage::Write => write!(f, "Write"),
        }
    }
}
