//! Decision layer of a focused web crawler.
//!
//! Given a fetched page, [`Scraper::scrape`] decides whether it counts as
//! content, records analytics for it exactly once per canonical URL, and
//! returns the outgoing links that pass the [`PageFilter`].

pub mod analytics;
pub mod app;
pub mod bad_urls;
pub mod canonical;
pub mod config;
pub mod error;
pub mod filter;
pub mod html;
pub mod links;
pub mod page;
pub mod scrape;
pub mod tokenizer;
pub mod traps;

pub use analytics::{Analytics, AnalyticsReport, LongestPage};
pub use bad_urls::BadUrlSet;
pub use canonical::{CanonicalUrl, Canonicalizer};
pub use config::{Config, CrawlPolicy};
pub use error::{ConfigError, Rejection};
pub use filter::PageFilter;
pub use page::FetchedPage;
pub use scrape::{PageOutcome, Scraper};
pub use traps::{TrapDetector, VariantTracker};
