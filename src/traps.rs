//! Crawl trap detection
//!
//! Static heuristics catch known trap shapes (calendars, archives, search
//! and feed endpoints, tracking parameters). The variant budget catches
//! unknown ones by capping how many distinct query strings a single
//! (host, path) may contribute.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::config::CrawlPolicy;

/// Distinct raw query strings observed per (host, path).
#[derive(Debug)]
pub struct VariantTracker {
    max_variants: usize,
    seen: Mutex<HashMap<(String, String), HashSet<String>>>,
}

impl VariantTracker {
    pub fn new(max_variants: usize) -> Self {
        Self {
            max_variants,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record `query` under `(host, path)` and report whether the budget is
    /// now exceeded. Insert and size check happen under one lock. A key
    /// stops growing once it holds `max_variants + 1` queries.
    pub fn record(&self, host: &str, path: &str, query: &str) -> bool {
        let mut seen = self.seen.lock();
        let variants = seen
            .entry((host.to_string(), path.to_string()))
            .or_default();
        if variants.len() > self.max_variants {
            return true;
        }
        variants.insert(query.to_string());
        variants.len() > self.max_variants
    }

    pub fn variants_for(&self, host: &str, path: &str) -> usize {
        self.seen
            .lock()
            .get(&(host.to_string(), path.to_string()))
            .map_or(0, HashSet::len)
    }

    pub fn tracked_paths(&self) -> usize {
        self.seen.lock().len()
    }
}

#[derive(Debug)]
pub struct TrapDetector {
    policy: Arc<CrawlPolicy>,
    variants: VariantTracker,
}

impl TrapDetector {
    pub fn new(policy: Arc<CrawlPolicy>) -> Self {
        let variants = VariantTracker::new(policy.max_variants_per_path);
        Self { policy, variants }
    }

    pub fn has_trap_path(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.policy
            .trap_path_substrings
            .iter()
            .any(|marker| path.contains(marker.as_str()))
    }

    pub fn has_trap_query(&self, url: &Url) -> bool {
        url.query_pairs()
            .any(|(key, _)| self.policy.trap_query_keys.contains(&key.to_lowercase()))
    }

    /// Stateful: counts the raw query of the un-canonicalized `url` against
    /// its (host, path). URLs without a query never touch the tracker.
    pub fn too_many_variants(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(query) = parsed.query().filter(|q| !q.is_empty()) else {
            return false;
        };
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        let path = parsed.path().to_ascii_lowercase();
        let exceeded = self.variants.record(&host, &path, query);
        if exceeded {
            tracing::trace!(%host, %path, "query variant budget exceeded");
        }
        exceeded
    }

    pub fn variants(&self) -> &VariantTracker {
        &self.variants
    }
}
