//! Process-wide crawl analytics.
//!
//! Every field is updated inside one critical section keyed on the
//! canonical URL, so a page contributes to the counts at most once no
//! matter how many workers report it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;

use crate::canonical::{CanonicalUrl, Canonicalizer};
use crate::config::CrawlPolicy;
use crate::tokenizer::{PageWords, WordFilter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongestPage {
    pub url: CanonicalUrl,
    pub words: usize,
}

#[derive(Debug, Default)]
struct AnalyticsState {
    unique_pages: HashSet<CanonicalUrl>,
    longest: Option<LongestPage>,
    word_freq: HashMap<String, u64>,
    stopword_freq: HashMap<String, u64>,
    subdomains: BTreeMap<String, HashSet<CanonicalUrl>>,
}

#[derive(Debug)]
pub struct Analytics {
    policy: Arc<CrawlPolicy>,
    canonicalizer: Canonicalizer,
    words: WordFilter,
    state: Mutex<AnalyticsState>,
}

impl Analytics {
    pub fn new(policy: Arc<CrawlPolicy>) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(policy.clone()),
            words: WordFilter::new(policy.clone()),
            policy,
            state: Mutex::new(AnalyticsState::default()),
        }
    }

    /// Tokenize `text` and record it under the canonical form of
    /// `final_url`. Returns false when that page was already counted.
    pub fn record_page(&self, final_url: &str, text: &str) -> bool {
        let canonical = self.canonicalizer.canonicalize(final_url);
        let words = self.words.split(text);
        self.record_words(canonical, &words)
    }

    /// Record pre-split words for an already canonical URL.
    pub fn record_words(&self, canonical: CanonicalUrl, words: &PageWords) -> bool {
        let subdomain = canonical
            .host()
            .and_then(|host| self.subdomain_key(&host));

        let mut state = self.state.lock();
        if state.unique_pages.contains(&canonical) {
            return false;
        }
        state.unique_pages.insert(canonical.clone());

        let word_count = words.word_count();
        if state.longest.as_ref().is_none_or(|l| word_count > l.words) {
            state.longest = Some(LongestPage {
                url: canonical.clone(),
                words: word_count,
            });
        }

        for word in &words.content {
            *state.word_freq.entry(word.clone()).or_insert(0) += 1;
        }
        for word in &words.stopwords {
            *state.stopword_freq.entry(word.clone()).or_insert(0) += 1;
        }

        if let Some(subdomain) = subdomain {
            state.subdomains.entry(subdomain).or_default().insert(canonical);
        }
        true
    }

    /// Subdomain bucket for `host`. Only hosts strictly below the parent
    /// domain are bucketed. A leading `www.` is stripped unless that would
    /// leave the bare parent, so `www.uci.edu` keeps its own bucket.
    fn subdomain_key(&self, host: &str) -> Option<String> {
        let parent = self.policy.analytics_parent_domain.as_str();
        let is_strict_subdomain = |h: &str| {
            h.strip_suffix(parent)
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
        };
        if !is_strict_subdomain(host) {
            return None;
        }
        let key = host
            .strip_prefix("www.")
            .filter(|stripped| is_strict_subdomain(stripped))
            .unwrap_or(host);
        Some(key.to_string())
    }

    pub fn unique_pages(&self) -> usize {
        self.state.lock().unique_pages.len()
    }

    pub fn is_counted(&self, canonical: &CanonicalUrl) -> bool {
        self.state.lock().unique_pages.contains(canonical)
    }

    pub fn word_count(&self, word: &str) -> u64 {
        self.state.lock().word_freq.get(word).copied().unwrap_or(0)
    }

    pub fn stopword_count(&self, word: &str) -> u64 {
        self.state.lock().stopword_freq.get(word).copied().unwrap_or(0)
    }

    /// Snapshot for the final report, with `top_n` entries per table.
    pub fn report(&self, top_n: usize) -> AnalyticsReport {
        let state = self.state.lock();
        AnalyticsReport {
            generated_at: Utc::now().to_rfc3339(),
            unique_pages: state.unique_pages.len(),
            longest_page: state.longest.clone(),
            top_words: top_entries(&state.word_freq, top_n),
            top_stopwords: top_entries(&state.stopword_freq, top_n),
            subdomains: state
                .subdomains
                .iter()
                .map(|(host, pages)| (host.clone(), pages.len()))
                .collect(),
        }
    }

}

fn top_entries(freq: &HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut entries = freq
        .iter()
        .map(|(word, count)| (word.clone(), *count))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

/// Final analytics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: String,
    pub unique_pages: usize,
    pub longest_page: Option<LongestPage>,
    /// Content words, highest count first, ties alphabetical
    pub top_words: Vec<(String, u64)>,
    pub top_stopwords: Vec<(String, u64)>,
    /// Distinct pages per subdomain, sorted by host
    pub subdomains: Vec<(String, usize)>,
}
