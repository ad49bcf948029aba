use athena_research::agents::{
    run_brief_mode, run_pipeline_mode, BriefAgent, ExecutorSettings, PipelineObserver, ResearchPipeline, RunOutcome,
};
use athena_research::llm::LLM;
use athena_research::models::PipelineStage;
use athena_research::parser::ParseError;
use athena_research::storage::ReportPersister;
use athena_research::tools::build_default_tools;
use athena_research::{utils, Config};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const GREETING: &str = "Hello, I'm Athena, your AI research assistant. What topic can I help you with? ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Search, analyze, critique and write in four stages
    Pipeline,
    /// One tool-using call returning a structured summary
    Brief,
}

#[derive(Debug, Parser)]
#[command(name = "athena", version, about = "AI research assistant for scientific literature")]
struct Cli {
    /// Research topic; prompted for on stdin when omitted
    query: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Pipeline)]
    mode: Mode,

    /// Config file (defaults to ./athena.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report file to append to
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    max_iterations: Option<usize>,

    /// openai, anthropic, groq or openrouter
    #[arg(long)]
    provider: Option<String>,

    #[arg(long)]
    model: Option<String>,
}

/// Prints one progress marker per stage
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn stage_started(&self, stage: PipelineStage) {
        println!("[{}/{}] {}...", stage.position(), PipelineStage::ALL.len(), stage.activity());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(provider) = &cli.provider {
        config.set_provider(provider);
    }
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.agent.max_iterations = max_iterations;
    }

    let _log_guard = utils::init_logger(&config.logging)?;

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(provider = %config.llm.provider, model = %config.llm.model, "Configuration loaded");

    let query = match cli.query {
        Some(query) => query,
        None => prompt_for_query()?,
    };

    let llm = Arc::new(LLM::new(config.llm.provider_config())?);
    let tools = build_default_tools(&config)?;
    let settings = ExecutorSettings::from_config(&config);
    let persister = ReportPersister::new(config.output.path.clone());

    match cli.mode {
        Mode::Pipeline => {
            let pipeline = ResearchPipeline::new(llm, tools, &settings).with_observer(Arc::new(ConsoleObserver));
            match run_pipeline_mode(&query, &pipeline, &persister).await? {
                RunOutcome::Saved(state) => println!(
                    "Research complete: {} paper(s), report appended to {}",
                    state.papers.len(),
                    persister.path().display()
                ),
                RunOutcome::Unparsed(e) => print_parse_failure(&e),
            }
        }
        Mode::Brief => {
            let agent = BriefAgent::new(llm, tools, &settings);
            match run_brief_mode(&query, &agent, &persister).await? {
                RunOutcome::Saved(response) => {
                    println!("Structured response: {:#?}", response);
                    println!("Report appended to {}", persister.path().display());
                }
                RunOutcome::Unparsed(e) => print_parse_failure(&e),
            }
        }
    }

    Ok(())
}

/// Not fatal: show what the model said; no report was written
fn print_parse_failure(e: &ParseError) {
    println!("Error parsing response: {}", e.message());
    println!("Raw output:\n{}", e.raw());
}

fn prompt_for_query() -> io::Result<String> {
    print!("{}", GREETING);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
