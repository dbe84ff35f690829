use std::future::Future;

use reqwest::Client;
use tracing::debug;

use crate::error::ScrapeError;
use crate::settings::Settings;

/// Source of raw HTML for a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, ScrapeError>> + Send;
}

/// Fetches pages over HTTP with one client for the lifetime of a run.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self { client })
    }

    /// Raw response body, for binary documents such as PDFs.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let response = self.get(url).await?;
        let body = response.bytes().await.map_err(|e| ScrapeError::body(url, e))?;
        Ok(body.to_vec())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ScrapeError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| ScrapeError::body(url, e))
    }
}

/// In-memory fetcher serving canned pages; unknown URLs answer 404.
#[cfg(test)]
#[derive(Default)]
pub struct MockFetcher {
    pages: std::collections::HashMap<String, String>,
    failing: std::collections::HashSet<String>,
    hits: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.hits.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: 500,
            });
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}
