//! Fetching and parsing of the upstream news portal.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Listing**: parse the portal homepage into article cards
//! 2. **Detail**: fetch each card's link and parse the body, date and
//!    corroborating sources out of the element named by the link fragment
//!
//! HTTP access goes through the [`PageFetcher`] trait so the parsing and the
//! refresh pipeline can be driven by canned HTML in tests.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};

pub mod hamropatro;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// Something that can turn a URL into a page of HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
