//! SerpAPI Client
//!
//! General web search through SerpAPI's Google Light engine. Used for recent
//! or non-academic topics that arXiv and PubMed do not cover.

use super::SearchError;
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Result from a Google Light search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightResult {
    /// Title of the result
    pub title: String,
    /// Snippet/description
    pub snippet: String,
    /// URL link
    pub link: String,
    /// Source domain
    pub source: Option<String>,
    /// Date if available
    pub date: Option<String>,
}

/// SerpAPI client for web search
pub struct SerpApiClient {
    api_key: String,
    max_results: usize,
}

impl SerpApiClient {
    /// Create a new SerpAPI client
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            max_results: 10,
        }
    }

    /// Configure client from config; `None` when no key is set
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.trim().is_empty() {
            return None;
        }

        Some(Self::new(config.serpapi_key.clone()).with_max_results(config.max_results))
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Search Google Light for quick web results
    pub async fn search_light(&self, query: &str) -> Result<Vec<LightResult>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey("SerpAPI"));
        }

        info!(query = %query, "Searching Google Light via SerpAPI");

        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), "google_light".to_string());
        params.insert("q".to_string(), query.to_string());
        params.insert("hl".to_string(), "en".to_string());
        params.insert("gl".to_string(), "us".to_string());
        params.insert("num".to_string(), self.max_results.to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());

        let results = search
            .json()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        debug!("Raw Light response received");

        let light_results = parse_light_results(&results, self.max_results)?;
        info!(count = light_results.len(), "Google Light search completed");
        Ok(light_results)
    }
}

/// Read `organic_results` out of a SerpAPI response.
///
/// A response without the key means no hits; an `error` field is surfaced.
pub fn parse_light_results(results: &Value, max_results: usize) -> Result<Vec<LightResult>, SearchError> {
    if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
        // SerpAPI reports an empty result page as an error string
        if error.contains("hasn't returned any results") {
            return Ok(Vec::new());
        }
        return Err(SearchError::RequestFailed(error.to_string()));
    }

    let organic_results = match results.get("organic_results") {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };

    let results_array = organic_results
        .as_array()
        .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

    let light_results = results_array
        .iter()
        .take(max_results)
        .map(|result| {
            let title = result
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Untitled")
                .to_string();

            let snippet = result
                .get("snippet")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let link = result
                .get("link")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let source = result
                .get("source")
                .and_then(|v| v.as_str())
                .map(String::from)
                .or_else(|| {
                    // Extract domain from link
                    link.split('/').nth(2).filter(|d| !d.is_empty()).map(String::from)
                });

            let date = result.get("date").and_then(|v| v.as_str()).map(String::from);

            LightResult {
                title,
                snippet,
                link,
                source,
                date,
            }
        })
        .collect();

    Ok(light_results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_light_results() {
        let raw = json!({
            "organic_results": [
                {"title": "CRISPR off-target review", "snippet": "A review", "link": "https://www.nature.com/articles/x"},
                {"title": "Second", "snippet": "More", "link": "https://example.org/a", "source": "Example", "date": "2024"},
                {"title": "Third", "link": "https://example.org/b"}
            ]
        });

        let results = parse_light_results(&raw, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source.as_deref(), Some("www.nature.com"));
        assert_eq!(results[1].source.as_deref(), Some("Example"));
        assert_eq!(results[1].date.as_deref(), Some("2024"));
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(parse_light_results(&json!({}), 5).unwrap().is_empty());
        let empty = json!({"error": "Google hasn't returned any results for this query."});
        assert!(parse_light_results(&empty, 5).unwrap().is_empty());
    }

    #[test]
    fn test_error_field_is_surfaced() {
        let raw = json!({"error": "Invalid API key."});
        assert!(matches!(parse_light_results(&raw, 5), Err(SearchError::RequestFailed(_))));
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = crate::config::SearchConfig {
            max_results: 3,
            web_enabled: true,
            arxiv_enabled: true,
            pubmed_enabled: false,
            arxiv_base_url: String::new(),
            pubmed_base_url: String::new(),
            serpapi_key: String::new(),
            ncbi_api_key: String::new(),
        };
        assert!(SerpApiClient::from_config(&config).is_none());

        config.serpapi_key = "serp-key".to_string();
        let client = SerpApiClient::from_config(&config).unwrap();
        assert_eq!(client.max_results, 3);
    }
}
