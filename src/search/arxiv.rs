//! arXiv Client
//!
//! Queries the public export API (`/api/query`) and reads the Atom feed with
//! plain string scanning; only a handful of tags are needed.

use super::{check_status, SearchError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One `<entry>` of the Atom feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivEntry {
    pub title: String,
    pub authors: Vec<String>,
    /// Abstract page, e.g. `http://arxiv.org/abs/2401.00001v1`
    pub url: String,
    pub summary: String,
    pub published: Option<String>,
}

pub struct ArxivClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl ArxivClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results: 5,
        }
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub async fn search(&self, query: &str) -> Result<Vec<ArxivEntry>, SearchError> {
        info!(query = %query, "Searching arXiv");

        let url = format!("{}/api/query", self.base_url);
        let search_query = format!("all:{}", query);
        let max_results = self.max_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        debug!(bytes = body.len(), "Raw arXiv feed received");

        if !body.contains("<feed") {
            return Err(SearchError::ParseError("expected an Atom feed".to_string()));
        }

        let entries = parse_atom_feed(&body);
        info!(count = entries.len(), "arXiv search completed");
        Ok(entries)
    }
}

/// Parse the entries of an arXiv Atom feed
pub fn parse_atom_feed(xml: &str) -> Vec<ArxivEntry> {
    xml.split("<entry>")
        .skip(1)
        .filter_map(|entry| {
            let title = extract_tag(entry, "title").map(|t| collapse_whitespace(&t))?;
            if title.is_empty() {
                return None;
            }

            let authors = entry
                .split("<author>")
                .skip(1)
                .filter_map(|a| extract_tag(a, "name"))
                .map(|name| collapse_whitespace(&name))
                .collect();

            Some(ArxivEntry {
                title,
                authors,
                url: extract_tag(entry, "id").map(|id| id.trim().to_string()).unwrap_or_default(),
                summary: extract_tag(entry, "summary")
                    .map(|s| collapse_whitespace(&s))
                    .unwrap_or_default(),
                published: extract_tag(entry, "published").map(|p| p.trim().to_string()),
            })
        })
        .collect()
}

/// Content between `<tag ...>` and `</tag>`, with the common XML entities decoded
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    // Skip tags that merely share a prefix, e.g. <id> vs <idx>
    let mut search_from = 0;
    let start = loop {
        let pos = xml[search_from..].find(&open)? + search_from;
        match xml[pos + open.len()..].chars().next() {
            Some('>') | Some(' ') | Some('\n') | Some('\t') => break pos,
            _ => search_from = pos + open.len(),
        }
    };

    let content_start = xml[start..].find('>')? + start + 1;
    let end = xml[content_start..].find(&close)? + content_start;
    Some(decode_entities(&xml[content_start..end]))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
