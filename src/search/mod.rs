//! Search Module
//!
//! Clients for the external literature sources:
//! - arXiv (Atom export API) for preprints
//! - PubMed (NCBI E-utilities) for biomedical literature
//! - Google Light via SerpAPI for general web results
//!
//! Each client does one request per lookup; no retries, no caching.

pub mod arxiv;
pub mod pubmed;
pub mod serpapi;

pub use arxiv::{ArxivClient, ArxivEntry};
pub use pubmed::{PubMedArticle, PubMedClient};
pub use serpapi::{LightResult, SerpApiClient};

use thiserror::Error;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0} API key not configured")]
    NoApiKey(&'static str),

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::RequestFailed(err.to_string())
    }
}

/// Return the response if it is a 2xx, otherwise a `Status` error with the body
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SearchError::Status {
        status: status.as_u16(),
        body,
    })
}
