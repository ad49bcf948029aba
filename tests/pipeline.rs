use athena_research::agents::{
    execute_research_pipeline, run_pipeline_mode, ExecutorSettings, ResearchPipeline, RunOutcome, NO_PAPERS_SENTINEL,
};
use athena_research::llm::ScriptedLLM;
use athena_research::models::PipelineStage;
use athena_research::storage::ReportPersister;
use athena_research::tools::{StaticTool, ToolSet};
use athena_research::types::{AppError, LLMResponse, ToolCall};
use serde_json::json;
use std::sync::Arc;

const QUERY: &str = "CRISPR gene editing off-target effects";
const PAPER_TITLE: &str = "Off-target analysis in CRISPR-Cas9";

fn arxiv_stub() -> Arc<StaticTool> {
    Arc::new(StaticTool::new(
        "arxiv_search",
        "Search arXiv",
        format!(
            "Title: {}\nAuthors: Jane Doe, John Roe\nURL: https://arxiv.org/abs/2401.00001\nSummary: Genome-wide off-target rates.",
            PAPER_TITLE
        ),
    ))
}

fn search_answer() -> String {
    format!(
        "Here is what I found:\n```json\n[{}]\n```",
        json!({
            "title": PAPER_TITLE,
            "authors": ["Jane Doe", "John Roe"],
            "url": "https://arxiv.org/abs/2401.00001",
            "summary": "Genome-wide off-target rates."
        })
    )
}

#[tokio::test]
async fn test_end_to_end_report_lists_references() {
    let llm = Arc::new(ScriptedLLM::new(vec![
        LLMResponse::tool_calls(vec![ToolCall::new(
            "call_1",
            "arxiv_search",
            json!({"query": "CRISPR off-target"}),
        )]),
        LLMResponse::text(search_answer()),
        LLMResponse::text("Off-target rates are low with high-fidelity Cas9 variants."),
        LLMResponse::text("Only one cell line was studied."),
        LLMResponse::text("## Summary\nHigh-fidelity variants reduce off-target edits.\n\n## Open Questions & Future Directions\n- In vivo rates?"),
    ]));
    let arxiv = arxiv_stub();
    let pipeline = ResearchPipeline::new(llm.clone(), ToolSet::new().with(arxiv.clone()), &ExecutorSettings::new("gpt-4.1"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("research_output.txt"));

    let state = execute_research_pipeline(QUERY, &pipeline, &persister).await.unwrap();

    assert_eq!(state.query, QUERY);
    assert_eq!(state.papers.len(), 1);
    assert_eq!(state.papers[0].title, PAPER_TITLE);
    assert!(!state.analysis.is_empty());
    assert_eq!(state.critique, "Only one cell line was studied.");
    assert!(state.report.contains("## References"));
    assert_eq!(arxiv.queries(), vec!["CRISPR off-target"]);
    assert_eq!(llm.remaining(), 0);

    let saved = std::fs::read_to_string(persister.path()).unwrap();
    assert!(saved.starts_with(&format!("--- Research Output: {} ---\nTimestamp: ", QUERY)));
    let references = saved.find("## References").unwrap();
    assert!(saved[references..].contains(&format!("1. {}", PAPER_TITLE)));
    assert!(saved[references..].contains("Link: https://arxiv.org/abs/2401.00001"));
}

#[tokio::test]
async fn test_no_papers_still_produces_a_report() {
    let llm = Arc::new(ScriptedLLM::new(vec![
        LLMResponse::text("```json\n{\"papers\": []}\n```"),
        LLMResponse::text("Nothing to critique."),
        LLMResponse::text("## Summary\nNo literature was found."),
    ]));
    let pipeline = ResearchPipeline::new(llm.clone(), ToolSet::new().with(arxiv_stub()), &ExecutorSettings::new("m"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("out.txt"));
    let state = execute_research_pipeline("an obscure topic", &pipeline, &persister).await.unwrap();

    assert!(state.papers.is_empty());
    assert_eq!(state.analysis, NO_PAPERS_SENTINEL);
    // search, critique, write; analysis skips the model
    assert_eq!(llm.call_count(), 3);
    assert!(llm.requests()[1].messages[0].content.contains(NO_PAPERS_SENTINEL));

    let saved = std::fs::read_to_string(persister.path()).unwrap();
    assert!(saved.contains("No references were found."));
}

#[tokio::test]
async fn test_failed_stage_writes_nothing() {
    let llm = Arc::new(ScriptedLLM::new(vec![
        LLMResponse::text(search_answer()),
        LLMResponse::text("analysis"),
        // critique has no response left
    ]));
    let pipeline = ResearchPipeline::new(llm, ToolSet::new().with(arxiv_stub()), &ExecutorSettings::new("m"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("out.txt"));
    let err = execute_research_pipeline(QUERY, &pipeline, &persister).await.unwrap_err();

    match err {
        AppError::Stage { stage, .. } => assert_eq!(stage, PipelineStage::Critique),
        other => panic!("expected stage error, got {:?}", other),
    }
    assert!(!persister.path().exists());
}

#[tokio::test]
async fn test_unparsable_search_output_fails_search_stage() {
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text("I could not format that, sorry.")]));
    let pipeline = ResearchPipeline::new(llm.clone(), ToolSet::new().with(arxiv_stub()), &ExecutorSettings::new("m"));

    let err = pipeline.run(QUERY).await.unwrap_err();
    assert!(err.to_string().starts_with("Search stage failed"));
    match err.root() {
        AppError::Parse(e) => assert_eq!(e.raw(), "I could not format that, sorry."),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_runaway_tool_loop_is_capped() {
    let calls = (0..10).map(|i| {
        LLMResponse::tool_calls(vec![ToolCall::new(
            format!("call_{}", i),
            "arxiv_search",
            json!({"query": "again"}),
        )])
    });
    let llm = Arc::new(ScriptedLLM::new(calls));
    let settings = ExecutorSettings {
        max_iterations: 4,
        ..ExecutorSettings::new("m")
    };
    let pipeline = ResearchPipeline::new(llm.clone(), ToolSet::new().with(arxiv_stub()), &settings);

    let err = pipeline.run(QUERY).await.unwrap_err();
    assert!(matches!(err.root(), AppError::IterationLimit(4)));
    assert_eq!(llm.call_count(), 4);
}

#[tokio::test]
async fn test_pipeline_mode_reports_raw_output_on_parse_failure() {
    let raw = "Sorry, here are some thoughts instead of JSON.";
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(raw)]));
    let pipeline = ResearchPipeline::new(llm, ToolSet::new().with(arxiv_stub()), &ExecutorSettings::new("m"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("out.txt"));

    match run_pipeline_mode(QUERY, &pipeline, &persister).await.unwrap() {
        RunOutcome::Unparsed(e) => {
            assert_eq!(e.raw(), raw);
            assert!(!e.message().is_empty());
        }
        RunOutcome::Saved(state) => panic!("expected unparsed outcome, got {:?}", state),
    }
    assert!(!persister.path().exists());
}

#[tokio::test]
async fn test_pipeline_mode_keeps_other_failures_fatal() {
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(search_answer())]));
    let pipeline = ResearchPipeline::new(llm, ToolSet::new().with(arxiv_stub()), &ExecutorSettings::new("m"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("out.txt"));

    let err = run_pipeline_mode(QUERY, &pipeline, &persister).await.unwrap_err();
    assert!(matches!(err, AppError::Stage { stage: PipelineStage::Analyze, .. }));
    assert!(!persister.path().exists());
}
