//! PubMed Client
//!
//! Two E-utilities calls per lookup:
//! 1. `esearch.fcgi` for the matching PMIDs
//! 2. `esummary.fcgi` for title, authors, journal and date of each PMID

use super::{check_status, SearchError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

const PUBMED_ARTICLE_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubMedArticle {
    pub pmid: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub pub_date: String,
    pub doi: Option<String>,
    pub url: String,
}

pub struct PubMedClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl PubMedClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            max_results: 5,
        }
    }

    /// NCBI key; raises the rate limit from 3 to 10 requests per second
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", "pubmed".to_string()), ("retmode", "json".to_string())];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    pub async fn search(&self, query: &str) -> Result<Vec<PubMedArticle>, SearchError> {
        info!(query = %query, "Searching PubMed");

        let ids = self.search_ids(query).await?;
        if ids.is_empty() {
            info!("PubMed returned no matching ids");
            return Ok(Vec::new());
        }

        let mut params = self.base_params();
        params.push(("id", ids.join(",")));

        let response = self
            .client
            .get(format!("{}/esummary.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?;
        let summary: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let articles = parse_summaries(&summary, &ids)?;
        info!(count = articles.len(), "PubMed search completed");
        Ok(articles)
    }

    async fn search_ids(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let mut params = self.base_params();
        params.push(("term", query.to_string()));
        params.push(("retmax", self.max_results.to_string()));

        let response = self
            .client
            .get(format!("{}/esearch.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?;
        let search: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let ids = search
            .get("esearchresult")
            .and_then(|r| r.get("idlist"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| SearchError::ParseError("esearch response has no idlist".to_string()))?
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect::<Vec<_>>();

        debug!(ids = ?ids, "PubMed esearch ids");
        Ok(ids)
    }
}

/// Build articles from an esummary document, keeping the esearch order
pub fn parse_summaries(summary: &Value, ids: &[String]) -> Result<Vec<PubMedArticle>, SearchError> {
    let result = summary
        .get("result")
        .ok_or_else(|| SearchError::ParseError("esummary response has no result".to_string()))?;

    let articles = ids
        .iter()
        .filter_map(|id| result.get(id.as_str()).map(|doc| (id, doc)))
        .map(|(id, doc)| {
            let authors = doc
                .get("authors")
                .and_then(|a| a.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|author| author.get("name").and_then(|n| n.as_str()))
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            let doi = doc
                .get("elocationid")
                .and_then(|v| v.as_str())
                .and_then(|loc| loc.split_whitespace().find(|part| part.starts_with("10.")))
                .map(String::from);

            PubMedArticle {
                pmid: id.clone(),
                title: string_field(doc, "title"),
                authors,
                journal: string_field(doc, "fulljournalname"),
                pub_date: string_field(doc, "pubdate"),
                doi,
                url: format!("{}/{}/", PUBMED_ARTICLE_BASE, id),
            }
        })
        .collect();

    Ok(articles)
}

fn string_field(doc: &Value, key: &str) -> String {
    doc.get(key).and_then(|v| v.as_str()).unwrap_or("").trim().to_string()
}
