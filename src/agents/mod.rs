//! Agent System
//!
//! The research agents and the pipeline that chains them:
//!
//! - **Search Agent**: tool-using literature search, returns papers as JSON
//! - **Analysis Agent**: synthesizes the papers
//! - **Critique Agent**: finds gaps and open questions in the analysis
//! - **Writer Agent**: writes the final report
//! - **Brief Agent**: single-shot alternative producing one structured response
//!
//! ## Pipeline Overview
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Search    │  → papers (tools: arxiv, pubmed, web)
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Analysis   │  → analysis
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Critique   │  → critique
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Writer    │  → report
//! └─────────────┘
//!      │
//!      ▼
//!  Report file
//! ```

pub mod analysis;
pub mod brief;
pub mod critique;
pub mod executor;
pub mod search;
pub mod writer;

// Re-export main components
pub use analysis::{AnalysisAgent, NO_PAPERS_SENTINEL};
pub use brief::{render_response, BriefAgent};
pub use critique::CritiqueAgent;
pub use executor::{ExecutorSettings, ModelAction, StageExecutor, DEFAULT_MAX_ITERATIONS};
pub use search::SearchAgent;
pub use writer::{render_references, WriterAgent};

use crate::llm::LLMAdapter;
use crate::models::{PipelineStage, ResearchState, ScientificResearchResponse};
use crate::parser::ParseError;
use crate::storage::ReportPersister;
use crate::tools::ToolSet;
use crate::types::{AppError, AppResult};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Receives stage transitions while a pipeline runs
pub trait PipelineObserver: Send + Sync {
    fn stage_started(&self, _stage: PipelineStage) {}

    fn stage_finished(&self, _stage: PipelineStage) {}

    fn stage_failed(&self, _stage: PipelineStage, _error: &AppError) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

pub struct ResearchPipeline {
    search: SearchAgent,
    analysis: AnalysisAgent,
    critique: CritiqueAgent,
    writer: WriterAgent,
    observer: Arc<dyn PipelineObserver>,
}

impl ResearchPipeline {
    /// Only the search stage is given the tools
    pub fn new(llm: Arc<dyn LLMAdapter>, tools: ToolSet, settings: &ExecutorSettings) -> Self {
        Self {
            search: SearchAgent::new(llm.clone(), tools, settings),
            analysis: AnalysisAgent::new(llm.clone(), settings),
            critique: CritiqueAgent::new(llm.clone(), settings),
            writer: WriterAgent::new(llm, settings),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run SEARCH -> ANALYZE -> CRITIQUE -> WRITE.
    ///
    /// Stops at the first failing stage; the error names that stage.
    pub async fn run(&self, query: &str) -> AppResult<ResearchState> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("Query must not be empty".to_string()));
        }

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("research_pipeline", run_id = %run_id);

        async {
            info!(query = %query, "Starting research pipeline");
            let mut state = ResearchState::new(query);

            state.papers = self
                .stage(PipelineStage::Search, self.search.find_papers(&state.query))
                .await?;
            state.analysis = self
                .stage(PipelineStage::Analyze, self.analysis.analyze(&state.papers))
                .await?;
            state.critique = self
                .stage(PipelineStage::Critique, self.critique.critique(&state.analysis))
                .await?;
            state.report = self
                .stage(
                    PipelineStage::Write,
                    self.writer
                        .write_report(&state.query, &state.analysis, &state.critique, &state.papers),
                )
                .await?;

            info!(
                paper_count = state.papers.len(),
                report_len = state.report.len(),
                "Research pipeline complete"
            );
            Ok(state)
        }
        .instrument(span)
        .await
    }

    async fn stage<T, F>(&self, stage: PipelineStage, work: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        info!(stage = %stage, "Stage started");
        self.observer.stage_started(stage);

        match work.await {
            Ok(value) => {
                info!(stage = %stage, "Stage finished");
                self.observer.stage_finished(stage);
                Ok(value)
            }
            Err(e) => {
                error!(stage = %stage, error = %e, "Stage failed");
                self.observer.stage_failed(stage, &e);
                Err(AppError::Stage {
                    stage,
                    source: Box::new(e),
                })
            }
        }
    }
}

/// Run the full pipeline for a query and append the report to `persister`.
///
/// Nothing is written when any stage fails.
pub async fn execute_research_pipeline(
    query: &str,
    pipeline: &ResearchPipeline,
    persister: &ReportPersister,
) -> AppResult<ResearchState> {
    let state = pipeline.run(query).await?;
    persister.persist(&state.report, &state.query).await?;
    info!(path = %persister.path().display(), "Report saved");
    Ok(state)
}

/// How a CLI run ended when it did not hit a hard error
#[derive(Debug)]
pub enum RunOutcome<T> {
    /// The result was appended to the report file
    Saved(T),
    /// The model's answer did not match the expected JSON; nothing was written
    Unparsed(ParseError),
}

/// Pipeline mode: a parse failure in any stage becomes [`RunOutcome::Unparsed`]
pub async fn run_pipeline_mode(
    query: &str,
    pipeline: &ResearchPipeline,
    persister: &ReportPersister,
) -> AppResult<RunOutcome<ResearchState>> {
    match execute_research_pipeline(query, pipeline, persister).await {
        Ok(state) => Ok(RunOutcome::Saved(state)),
        Err(e) => unparsed_or(e),
    }
}

/// Brief mode: the rendered response is saved only when it parsed
pub async fn run_brief_mode(
    query: &str,
    agent: &BriefAgent,
    persister: &ReportPersister,
) -> AppResult<RunOutcome<ScientificResearchResponse>> {
    let response = match agent.run(query).await {
        Ok(response) => response,
        Err(e) => return unparsed_or(e),
    };

    persister.persist(&render_response(&response), &response.topic).await?;
    info!(path = %persister.path().display(), "Brief report saved");
    Ok(RunOutcome::Saved(response))
}

fn unparsed_or<T>(err: AppError) -> AppResult<RunOutcome<T>> {
    match err.root() {
        AppError::Parse(e) => {
            error!(error = %e, "Model output could not be parsed");
            Ok(RunOutcome::Unparsed(e.clone()))
        }
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLLM;
    use crate::tools::StaticTool;
    use crate::types::LLMResponse;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PipelineObserver for RecordingObserver {
        fn stage_started(&self, stage: PipelineStage) {
            self.events.lock().unwrap().push(format!("start {}", stage));
        }

        fn stage_finished(&self, stage: PipelineStage) {
            self.events.lock().unwrap().push(format!("finish {}", stage));
        }

        fn stage_failed(&self, stage: PipelineStage, _error: &AppError) {
            self.events.lock().unwrap().push(format!("fail {}", stage));
        }
    }

    fn tools() -> ToolSet {
        ToolSet::new().with(Arc::new(StaticTool::new("arxiv_search", "arXiv", "no hits")))
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            LLMResponse::text("[]"),
            LLMResponse::text("critique of nothing"),
            LLMResponse::text("## Summary\nNothing found."),
        ]));
        let observer = Arc::new(RecordingObserver::default());
        let pipeline =
            ResearchPipeline::new(llm.clone(), tools(), &ExecutorSettings::new("m")).with_observer(observer.clone());

        let state = pipeline.run("  dark matter in soil  ").await.unwrap();

        assert_eq!(state.query, "dark matter in soil");
        assert_eq!(state.analysis, NO_PAPERS_SENTINEL);
        assert_eq!(state.critique, "critique of nothing");
        assert!(state.report.contains("No references were found."));
        // The analysis stage never called the model
        assert_eq!(llm.call_count(), 3);
        assert_eq!(
            observer.events(),
            vec![
                "start Search",
                "finish Search",
                "start Analyze",
                "finish Analyze",
                "start Critique",
                "finish Critique",
                "start Write",
                "finish Write"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_names_stage_and_halts() {
        // Search succeeds with one paper, analysis gets no scripted response
        let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(
            r#"[{"title": "T", "authors": [], "url": "u", "summary": "s"}]"#,
        )]));
        let observer = Arc::new(RecordingObserver::default());
        let pipeline =
            ResearchPipeline::new(llm.clone(), tools(), &ExecutorSettings::new("m")).with_observer(observer.clone());

        let err = pipeline.run("topic").await.unwrap_err();
        assert!(matches!(err, AppError::Stage { stage: PipelineStage::Analyze, .. }));
        assert!(matches!(err.root(), AppError::LLMApi(_)));
        assert_eq!(observer.events().last().map(String::as_str), Some("fail Analyze"));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let llm = Arc::new(ScriptedLLM::new(vec![]));
        let pipeline = ResearchPipeline::new(llm.clone(), tools(), &ExecutorSettings::new("m"));
        assert!(matches!(pipeline.run("").await, Err(AppError::InvalidRequest(_))));
        assert_eq!(llm.call_count(), 0);
    }
}
