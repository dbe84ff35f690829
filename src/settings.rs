use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://peraturan.bpk.go.id";
pub const DEFAULT_LIST_URL: &str = "https://peraturan.bpk.go.id/Search?tema=49";
pub const DEFAULT_DB_PATH: &str = "data/bpk.sqlite";
pub const DEFAULT_PDF_DIR: &str = "data/pdfs";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Runtime settings: built-in defaults overlaid by `BPK_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Site origin used to absolutize relative links.
    pub base_url: String,
    /// Search listing walked for detail links; the page number is appended as `p=`.
    pub list_url: String,
    pub db_path: String,
    /// Where downloaded regulation PDFs are written.
    pub pdf_dir: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause between listing pages.
    pub page_delay_ms: u64,
    /// Pause after every processed detail page.
    pub item_delay_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(Config::builder().add_source(Environment::with_prefix("BPK")))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("list_url", DEFAULT_LIST_URL)?
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("pdf_dir", DEFAULT_PDF_DIR)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("timeout_secs", 30)?
            .set_default("page_delay_ms", 500)?
            .set_default("item_delay_ms", 1000)?
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Failed to deserialize settings")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

#[cfg(test)]
impl Settings {
    /// Settings pointing at a local mock server, with no politeness delays.
    pub fn for_tests(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            list_url: format!("{base_url}/Search?tema=49"),
            db_path: ":memory:".to_string(),
            pdf_dir: "data/pdfs".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 5,
            page_delay_ms: 0,
            item_delay_ms: 0,
        }
    }
}
