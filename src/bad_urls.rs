use dashmap::DashSet;

use crate::canonical::CanonicalUrl;

/// Canonical URLs whose fetch failed permanently. Append-only.
#[derive(Debug, Default)]
pub struct BadUrlSet {
    urls: DashSet<CanonicalUrl>,
}

impl BadUrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the URL was not already marked.
    pub fn mark(&self, url: CanonicalUrl) -> bool {
        self.urls.insert(url)
    }

    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::Canonicalizer;
    use crate::config::CrawlPolicy;
    use std::sync::Arc;

    #[test]
    fn test_mark_is_idempotent_per_canonical_url() {
        let canonicalizer = Canonicalizer::new(Arc::new(CrawlPolicy::default()));
        let bad = BadUrlSet::new();
        assert!(bad.is_empty());

        assert!(bad.mark(canonicalizer.canonicalize("https://ics.uci.edu/gone")));
        assert!(!bad.mark(canonicalizer.canonicalize("https://ICS.uci.edu/gone/#x")));
        assert!(bad.mark(canonicalizer.canonicalize("https://ics.uci.edu/other")));

        assert_eq!(bad.len(), 2);
        assert!(!bad.is_empty());
        assert!(bad.contains(&canonicalizer.canonicalize("https://ics.uci.edu/gone")));
    }
}
