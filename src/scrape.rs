//! Per-page entry point: bookkeeping for the fetched page and the list of
//! outgoing links worth adding to the frontier.

use std::collections::HashSet;
use std::sync::Arc;

use crate::analytics::Analytics;
use crate::bad_urls::BadUrlSet;
use crate::canonical::Canonicalizer;
use crate::config::CrawlPolicy;
use crate::filter::PageFilter;
use crate::html::extract_visible_text;
use crate::links::extract_links;
use crate::page::FetchedPage;
use crate::tokenizer::WordFilter;

/// How a page was handled, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Missing,
    MarkedBad,
    NotOk,
    EmptyBody,
    NotHtml,
    TooThin { words: usize },
    Scraped { words: usize, links: usize },
}

#[derive(Debug)]
pub struct Scraper {
    policy: Arc<CrawlPolicy>,
    canonicalizer: Canonicalizer,
    words: WordFilter,
    filter: PageFilter,
    analytics: Arc<Analytics>,
}

impl Scraper {
    pub fn new(policy: Arc<CrawlPolicy>, analytics: Arc<Analytics>) -> Self {
        Self::with_bad_urls(policy, analytics, Arc::new(BadUrlSet::new()))
    }

    pub fn with_bad_urls(
        policy: Arc<CrawlPolicy>,
        analytics: Arc<Analytics>,
        bad_urls: Arc<BadUrlSet>,
    ) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(policy.clone()),
            words: WordFilter::new(policy.clone()),
            filter: PageFilter::new(policy.clone(), bad_urls),
            policy,
            analytics,
        }
    }

    /// Canonicalized, filtered outgoing links of `page`; empty when the page
    /// contributes nothing.
    pub fn scrape(&self, requested_url: &str, page: Option<&FetchedPage>) -> Vec<String> {
        self.scrape_with_outcome(requested_url, page).0
    }

    pub fn scrape_with_outcome(
        &self,
        requested_url: &str,
        page: Option<&FetchedPage>,
    ) -> (Vec<String>, PageOutcome) {
        let Some(page) = page.filter(|p| p.body.is_some()) else {
            tracing::debug!(url = %requested_url, "no response to scrape");
            return (Vec::new(), PageOutcome::Missing);
        };
        let final_url = if page.resolved_url().trim().is_empty() {
            requested_url
        } else {
            page.resolved_url()
        };

        if self.policy.is_bad_status(page.status) {
            let canonical = self.canonicalizer.canonicalize(final_url);
            tracing::debug!(url = %canonical, status = page.status, "marking permanently bad");
            self.filter.bad_urls().mark(canonical);
            return (Vec::new(), PageOutcome::MarkedBad);
        }

        if page.status != 200 {
            tracing::debug!(url = %final_url, status = page.status, "skipping non-200 response");
            return (Vec::new(), PageOutcome::NotOk);
        }
        if page.body.as_ref().is_none_or(|b| b.is_empty()) {
            return (Vec::new(), PageOutcome::EmptyBody);
        }
        if !page.declares_html_or_unknown() {
            tracing::debug!(url = %final_url, mime = ?page.mime(), "skipping non-HTML response");
            return (Vec::new(), PageOutcome::NotHtml);
        }

        let html = page.text();
        let text = extract_visible_text(&html);
        let words = self.words.split(&text);
        if words.word_count() < self.policy.min_words {
            tracing::debug!(url = %final_url, words = words.word_count(), "page below minimum word count");
            return (
                Vec::new(),
                PageOutcome::TooThin {
                    words: words.word_count(),
                },
            );
        }

        let canonical = self.canonicalizer.canonicalize(final_url);
        let first_visit = self.analytics.record_words(canonical, &words);

        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        for link in extract_links(&html, final_url) {
            let candidate = self.canonicalizer.canonicalize(&link).into_string();
            if seen.insert(candidate.clone()) && self.filter.is_valid(&candidate) {
                accepted.push(candidate);
            }
        }

        tracing::debug!(
            url = %final_url,
            words = words.word_count(),
            links = accepted.len(),
            first_visit,
            "scraped page"
        );
        let outcome = PageOutcome::Scraped {
            words: words.word_count(),
            links: accepted.len(),
        };
        (accepted, outcome)
    }

    pub fn is_valid(&self, url: &str) -> bool {
        self.filter.is_valid(url)
    }

    pub fn canonicalize(&self, url: &str) -> String {
        self.canonicalizer.canonicalize(url).into_string()
    }

    pub fn filter(&self) -> &PageFilter {
        &self.filter
    }

    pub fn analytics(&self) -> &Arc<Analytics> {
        &self.analytics
    }
}
