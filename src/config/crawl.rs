//! Fetch-loop settings for the bundled crawl driver

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = concat!("linkgate/", env!("CARGO_PKG_VERSION"));

const MAX_FETCH_CONCURRENCY: usize = 256;

/// Settings for the driver that fetches pages and feeds them to the scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Stop after this many fetches
    pub max_pages: usize,
    /// Concurrent in-flight fetches
    pub fetch_concurrency: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            fetch_concurrency: 12,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlSettings {
    pub fn sanitized_concurrency(&self) -> usize {
        sanitize_fetch_concurrency(self.fetch_concurrency)
    }

    pub(super) fn collect_errors(&self, errors: &mut Vec<String>) {
        if self.max_pages == 0 {
            errors.push("crawl.max_pages must be positive".to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("crawl.request_timeout_secs must be positive".to_string());
        }
        if self.user_agent.trim().is_empty() {
            errors.push("crawl.user_agent must not be empty".to_string());
        }
    }
}

pub fn sanitize_fetch_concurrency(value: usize) -> usize {
    value.clamp(1, MAX_FETCH_CONCURRENCY)
}
