//! Built-in research tools
//!
//! Thin adapters from the search clients to [`ResearchTool`], rendering each
//! hit as a plain-text block the model can quote from.

use super::{ResearchTool, ToolError, ToolSet};
use crate::config::Config;
use crate::search::{ArxivClient, ArxivEntry, LightResult, PubMedArticle, PubMedClient, SerpApiClient};
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const NO_RESULTS: &str = "No results found.";

/// Name of the general web search tool; the others are academic sources
pub const WEB_SEARCH: &str = "web_search";

pub struct WebSearchTool {
    client: SerpApiClient,
}

impl WebSearchTool {
    pub fn new(client: SerpApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResearchTool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        "General web search. Use only as a last resort, for very recent or non-academic topics \
         that arXiv and PubMed do not cover."
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let results = self
            .client
            .search_light(query)
            .await
            .map_err(|e| ToolError::search(self.name(), e))?;
        Ok(render_blocks(results.iter().map(format_light_result)))
    }
}

pub struct ArxivTool {
    client: ArxivClient,
}

impl ArxivTool {
    pub fn new(client: ArxivClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResearchTool for ArxivTool {
    fn name(&self) -> &str {
        "arxiv_search"
    }

    fn description(&self) -> &str {
        "Search arXiv for preprints in physics, mathematics, computer science, quantitative biology \
         and related fields. Returns titles, authors, links and abstracts."
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let entries = self
            .client
            .search(query)
            .await
            .map_err(|e| ToolError::search(self.name(), e))?;
        Ok(render_blocks(entries.iter().map(format_arxiv_entry)))
    }
}

pub struct PubMedTool {
    client: PubMedClient,
}

impl PubMedTool {
    pub fn new(client: PubMedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResearchTool for PubMedTool {
    fn name(&self) -> &str {
        "pubmed_search"
    }

    fn description(&self) -> &str {
        "Search PubMed for peer-reviewed biomedical and life-science literature. Returns titles, \
         authors, journals, publication dates and links."
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        let articles = self
            .client
            .search(query)
            .await
            .map_err(|e| ToolError::search(self.name(), e))?;
        Ok(render_blocks(articles.iter().map(format_pubmed_article)))
    }
}

/// A tool that answers every query with the same text (or the same error).
///
/// Records the queries it receives.
pub struct StaticTool {
    name: String,
    description: String,
    response: Result<String, String>,
    queries: Mutex<Vec<String>>,
}

impl StaticTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            response: Ok(response.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: impl Into<String>, description: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            ..Self::new(name, description, "")
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ResearchTool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        self.response.clone().map_err(|message| ToolError::Failed {
            tool: self.name.clone(),
            message,
        })
    }
}

/// Build the tool set enabled by configuration.
///
/// Web search is skipped with a warning when no SerpAPI key is configured.
pub fn build_default_tools(config: &Config) -> AppResult<ToolSet> {
    let search = &config.search;
    let http = crate::llm::provider::http_client(config.llm.request_timeout())?;
    let mut tools = ToolSet::new();

    if search.arxiv_enabled {
        let client = ArxivClient::new(http.clone(), &search.arxiv_base_url).with_max_results(search.max_results);
        tools.push(Arc::new(ArxivTool::new(client)));
    }

    if search.pubmed_enabled {
        let client = PubMedClient::new(http.clone(), &search.pubmed_base_url)
            .with_api_key(&search.ncbi_api_key)
            .with_max_results(search.max_results);
        tools.push(Arc::new(PubMedTool::new(client)));
    }

    if search.web_enabled {
        match SerpApiClient::from_config(search) {
            Some(client) => tools.push(Arc::new(WebSearchTool::new(client))),
            None => warn!("SERPAPI_API_KEY not set, web search disabled"),
        }
    }

    if tools.is_empty() {
        return Err(AppError::Config("All research tools are disabled".to_string()));
    }

    info!(tools = ?tools.names(), "Research tools ready");
    Ok(tools)
}

fn render_blocks<I: Iterator<Item = String>>(blocks: I) -> String {
    let blocks: Vec<String> = blocks.collect();
    if blocks.is_empty() {
        NO_RESULTS.to_string()
    } else {
        blocks.join("\n\n")
    }
}

fn format_arxiv_entry(entry: &ArxivEntry) -> String {
    let mut block = format!("Title: {}\nAuthors: {}\nURL: {}", entry.title, entry.authors.join(", "), entry.url);
    if let Some(published) = &entry.published {
        block.push_str(&format!("\nPublished: {}", published));
    }
    block.push_str(&format!("\nSummary: {}", entry.summary));
    block
}

fn format_pubmed_article(article: &PubMedArticle) -> String {
    let mut block = format!(
        "Title: {}\nAuthors: {}\nJournal: {} ({})\nURL: {}",
        article.title,
        article.authors.join(", "),
        article.journal,
        article.pub_date,
        article.url
    );
    if let Some(doi) = &article.doi {
        block.push_str(&format!("\nDOI: {}", doi));
    }
    block
}

fn format_light_result(result: &LightResult) -> String {
    let source = result.source.as_deref().unwrap_or("unknown source");
    format!(
        "Title: {}\nURL: {}\nSource: {}\nSnippet: {}",
        result.title, result.link, source, result.snippet
    )
}
