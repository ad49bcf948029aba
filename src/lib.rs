// Athena Research - tool-using LLM research assistant for scientific literature

pub mod config;
pub mod models;
pub mod types;
pub mod parser;    // JSON extraction from model output
pub mod agents;
pub mod llm;
pub mod search;    // Search APIs (arXiv, PubMed, SerpAPI)
pub mod tools;     // Search APIs exposed to the model
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use agents::{
    execute_research_pipeline, run_brief_mode, run_pipeline_mode, BriefAgent, ExecutorSettings, PipelineObserver,
    ResearchPipeline, RunOutcome,
};
pub use config::Config;
pub use models::{Paper, PipelineStage, ResearchState, ScientificResearchResponse};
pub use storage::ReportPersister;
// Note: Import specific items from types module instead of glob to avoid name conflicts
// e.g., use athena_research::types::{LLMRequest, LLMResponse, AppResult};
