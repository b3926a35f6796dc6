//! Regulator guideline fetch
//!
//! Downloads a guideline page and reduces it to visible text with the same
//! extractor used for templates, so the delegated evaluator can quote it.

use sendcheck_core::{extract_visible_text, Error, Result};
use tracing::{info, warn};
use url::Url;

use crate::client;

const COLLABORATOR: &str = "guidelines";

/// Fetches regulator guideline text
#[derive(Debug)]
pub struct GuidelineFetcher {
    client: reqwest::Client,
    url: Url,
}

impl GuidelineFetcher {
    /// Create a fetcher for `url`
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::config(format!("invalid guidelines URL '{}': {}", url, e)))?;
        let client = client::build_client(COLLABORATOR, timeout_secs)?;
        Ok(Self { client, url })
    }

    /// Page this fetcher downloads
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Download the page and return its visible text
    pub async fn fetch(&self) -> Result<String> {
        let request = self.client.get(self.url.clone());
        let response = client::send(COLLABORATOR, request).await?;
        let response = client::require_success(COLLABORATOR, response).await?;
        let html = response
            .text()
            .await
            .map_err(|e| Error::collaborator(COLLABORATOR, format!("unreadable body: {}", e)))?;

        let text = extract_visible_text(&html)?;
        info!(url = %self.url, chars = text.len(), "Fetched regulator guidelines");
        Ok(text)
    }

    /// Fetch, logging and discarding any failure
    pub async fn fetch_or_skip(&self) -> Option<String> {
        match self.fetch().await {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => {
                warn!(url = %self.url, "Guideline page had no visible text");
                None
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Guideline fetch failed, using rule descriptions only");
                None
            }
        }
    }
}
