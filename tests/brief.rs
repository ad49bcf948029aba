use athena_research::agents::{render_response, run_brief_mode, BriefAgent, ExecutorSettings, RunOutcome};
use athena_research::llm::ScriptedLLM;
use athena_research::storage::ReportPersister;
use athena_research::tools::{StaticTool, ToolSet};
use athena_research::types::{AppError, LLMResponse, ToolCall};
use serde_json::json;
use std::sync::Arc;

fn tools() -> (Arc<StaticTool>, ToolSet) {
    let pubmed = Arc::new(StaticTool::new(
        "pubmed_search",
        "Search PubMed",
        "Title: Metformin and ageing\nAuthors: Doe J\nJournal: Cell (2022)\nURL: https://pubmed.ncbi.nlm.nih.gov/1/",
    ));
    (pubmed.clone(), ToolSet::new().with(pubmed))
}

#[tokio::test]
async fn test_brief_response_is_rendered_and_saved() {
    let answer = json!({
        "topic": "Metformin and ageing",
        "summary": "Metformin shows modest effects on ageing markers.",
        "key_papers": [{
            "title": "Metformin and ageing",
            "authors": ["Doe J"],
            "url": "https://pubmed.ncbi.nlm.nih.gov/1/",
            "summary": "Cohort study."
        }],
        "unanswered_questions": ["Does the effect hold in non-diabetic adults?"],
        "tools_used": ["pubmed_search"],
        "confidence": "moderate"
    });
    let llm = Arc::new(ScriptedLLM::new(vec![
        LLMResponse::tool_calls(vec![ToolCall::new("t1", "pubmed_search", json!({"query": "metformin ageing"}))]),
        LLMResponse::text(format!("```json\n{}\n```", answer)),
    ]));
    let (pubmed, tools) = tools();
    let agent = BriefAgent::new(llm, tools, &ExecutorSettings::new("gpt-4.1"));

    let response = agent.run("metformin and ageing").await.unwrap();
    assert_eq!(response.tools_used, vec!["pubmed_search"]);
    assert_eq!(pubmed.queries(), vec!["metformin ageing"]);

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("research_output.txt"));
    persister.persist(&render_response(&response), &response.topic).await.unwrap();

    let saved = std::fs::read_to_string(persister.path()).unwrap();
    assert!(saved.starts_with("--- Research Output: Metformin and ageing ---\n"));
    assert!(saved.contains("## Open Questions & Future Directions\n\n- Does the effect hold in non-diabetic adults?"));
    assert!(saved.contains("## References\n\n1. Metformin and ageing"));
}

#[tokio::test]
async fn test_brief_parse_failure_exposes_raw_output() {
    let raw = "Metformin is interesting, but I could not find much.";
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(raw)]));
    let (_, tools) = tools();
    let agent = BriefAgent::new(llm, tools, &ExecutorSettings::new("gpt-4.1"));

    match agent.run("metformin").await {
        Err(AppError::Parse(e)) => {
            assert_eq!(e.raw(), raw);
            assert!(!e.message().is_empty());
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_brief_missing_field_is_a_parse_error() {
    let raw = r#"```json
{"topic": "t", "summary": "s", "key_papers": [], "unanswered_questions": []}
```"#;
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(raw)]));
    let (_, tools) = tools();
    let agent = BriefAgent::new(llm, tools, &ExecutorSettings::new("gpt-4.1"));

    match agent.run("anything").await {
        Err(AppError::Parse(e)) => {
            assert!(e.message().contains("tools_used"));
            assert_eq!(e.raw(), raw);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_brief_mode_writes_nothing_when_unparsed() {
    let raw = "Metformin is interesting, but here is prose instead of JSON.";
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(raw)]));
    let (_, tools) = tools();
    let agent = BriefAgent::new(llm, tools, &ExecutorSettings::new("gpt-4.1"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("research_output.txt"));

    match run_brief_mode("metformin", &agent, &persister).await.unwrap() {
        RunOutcome::Unparsed(e) => assert_eq!(e.raw(), raw),
        RunOutcome::Saved(response) => panic!("expected unparsed outcome, got {:?}", response),
    }
    assert!(!persister.path().exists());
}

#[tokio::test]
async fn test_brief_mode_saves_parsed_response() {
    let answer = json!({
        "topic": "Metformin and ageing",
        "summary": "Modest effects.",
        "key_papers": [],
        "unanswered_questions": [],
        "tools_used": []
    });
    let llm = Arc::new(ScriptedLLM::new(vec![LLMResponse::text(answer.to_string())]));
    let (_, tools) = tools();
    let agent = BriefAgent::new(llm, tools, &ExecutorSettings::new("gpt-4.1"));

    let dir = tempfile::tempdir().unwrap();
    let persister = ReportPersister::new(dir.path().join("research_output.txt"));

    let outcome = run_brief_mode("metformin", &agent, &persister).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Saved(ref r) if r.topic == "Metformin and ageing"));

    let saved = std::fs::read_to_string(persister.path()).unwrap();
    assert!(saved.starts_with("--- Research Output: Metformin and ageing ---\n"));
    assert!(saved.contains("No references were found."));
}
