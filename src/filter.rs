//! Accept/reject decision for candidate frontier URLs.

use std::sync::Arc;

use url::Url;

use crate::bad_urls::BadUrlSet;
use crate::canonical::Canonicalizer;
use crate::config::CrawlPolicy;
use crate::error::Rejection;
use crate::traps::TrapDetector;

#[derive(Debug)]
pub struct PageFilter {
    policy: Arc<CrawlPolicy>,
    canonicalizer: Canonicalizer,
    traps: TrapDetector,
    bad_urls: Arc<BadUrlSet>,
}

impl PageFilter {
    pub fn new(policy: Arc<CrawlPolicy>, bad_urls: Arc<BadUrlSet>) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(policy.clone()),
            traps: TrapDetector::new(policy.clone()),
            policy,
            bad_urls,
        }
    }

    pub fn is_valid(&self, url: &str) -> bool {
        match self.check(url) {
            Ok(_) => true,
            Err(reason) => {
                tracing::trace!(%url, %reason, "rejected");
                false
            }
        }
    }

    /// Run the checks cheapest-first and stop at the first failure.
    ///
    /// The variant budget is charged before the hardening and extension
    /// checks, so a URL refused later still counts against its path.
    pub fn check(&self, url: &str) -> Result<Url, Rejection> {
        let parsed = Url::parse(url.trim()).map_err(|err| Rejection::Malformed(err.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(Rejection::UnsupportedScheme(other.to_string())),
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(Rejection::MissingHost)?
            .to_ascii_lowercase();
        if !self.policy.host_allowed(&host) {
            return Err(Rejection::DisallowedHost(host));
        }

        if self.bad_urls.contains(&self.canonicalizer.canonicalize(url)) {
            return Err(Rejection::KnownBad);
        }

        if self.traps.has_trap_path(parsed.path()) {
            return Err(Rejection::TrapPath);
        }
        if self.traps.has_trap_query(&parsed) {
            return Err(Rejection::TrapQuery);
        }
        if self.traps.too_many_variants(url.trim()) {
            return Err(Rejection::TooManyVariants);
        }

        let path = parsed.path().to_ascii_lowercase();
        self.check_event_browsing(&path)?;
        self.check_wiki_actions(&path, &parsed)?;
        self.check_extension(&path)?;

        Ok(parsed)
    }

    fn check_event_browsing(&self, path: &str) -> Result<(), Rejection> {
        if path.contains("/events/")
            && self
                .policy
                .event_browse_markers
                .iter()
                .any(|marker| path.contains(marker.as_str()))
        {
            return Err(Rejection::EventBrowsing);
        }
        Ok(())
    }

    fn check_wiki_actions(&self, path: &str, url: &Url) -> Result<(), Rejection> {
        if !path.contains("doku.php") {
            return Ok(());
        }

        let mut action = None;
        let mut has_rev = false;
        let mut idx = None;
        let mut id = None;
        // Last occurrence wins; blank values count as absent.
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "do" => action = Some(value.into_owned()),
                "rev" => has_rev = true,
                "idx" => idx = Some(value.into_owned()),
                "id" => id = Some(value.into_owned()),
                _ => {}
            }
        }

        if action.is_some_and(|a| self.policy.wiki_blocked_actions.contains(&a)) {
            return Err(Rejection::WikiAction);
        }
        if has_rev {
            return Err(Rejection::WikiAction);
        }
        if idx.is_some() && id.is_none() {
            return Err(Rejection::WikiAction);
        }
        Ok(())
    }

    fn check_extension(&self, path: &str) -> Result<(), Rejection> {
        let Some((_, ext)) = path.rsplit_once('.') else {
            return Ok(());
        };
        if !ext.contains('/') && self.policy.non_html_extensions.contains(ext) {
            return Err(Rejection::NonHtmlExtension(ext.to_string()));
        }
        Ok(())
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn traps(&self) -> &TrapDetector {
        &self.traps
    }

    pub fn bad_urls(&self) -> &Arc<BadUrlSet> {
        &self.bad_urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(policy: CrawlPolicy) -> PageFilter {
        PageFilter::new(Arc::new(policy), Arc::new(BadUrlSet::new()))
    }

    fn filter() -> PageFilter {
        filter_with(CrawlPolicy::default())
    }

    #[test]
    fn test_extension_rejection() {
        let filter = filter();
        assert!(!filter.is_valid("https://ics.uci.edu/foo.pdf"));
        assert!(!filter.is_valid("https://ics.uci.edu/dist/pkg.TAR.GZ"));
        assert!(filter.is_valid("https://ics.uci.edu/foo.html"));
        assert!(filter.is_valid("https://ics.uci.edu/v1.2/readme"));
        assert_eq!(
            filter.check("https://ics.uci.edu/slides.pptx").unwrap_err(),
            Rejection::NonHtmlExtension("pptx".to_string())
        );
    }

    #[test]
    fn test_domain_scoping() {
        let filter = filter();
        assert!(!filter.is_valid("https://attacker.com/x"));
        assert!(!filter.is_valid("https://notics.uci.edu/x"));
        assert!(filter.is_valid("https://vision.ics.uci.edu/x"));
        assert!(filter.is_valid("http://stat.uci.edu/"));
    }

    #[test]
    fn test_scheme_and_malformed() {
        let filter = filter();
        assert!(matches!(
            filter.check("ftp://ics.uci.edu/file").unwrap_err(),
            Rejection::UnsupportedScheme(_)
        ));
        assert!(matches!(filter.check("not a url").unwrap_err(), Rejection::Malformed(_)));
        assert!(matches!(filter.check("").unwrap_err(), Rejection::Malformed(_)));
    }

    #[test]
    fn test_known_bad_short_circuits() {
        let filter = filter();
        let url = "https://ics.uci.edu/gone";
        assert!(filter.is_valid(url));
        filter
            .bad_urls()
            .mark(filter.canonicalizer().canonicalize("https://ICS.uci.edu/gone/#x"));
        assert_eq!(filter.check(url).unwrap_err(), Rejection::KnownBad);
    }

    #[test]
    fn test_trap_path_and_query() {
        let filter = filter();
        assert_eq!(
            filter.check("https://ics.uci.edu/calendar/2024").unwrap_err(),
            Rejection::TrapPath
        );
        assert_eq!(
            filter.check("https://ics.uci.edu/news?utm_source=x").unwrap_err(),
            Rejection::TrapQuery
        );
    }

    #[test]
    fn test_event_browsing_rules() {
        let mut policy = CrawlPolicy::default();
        policy.trap_path_substrings.retain(|s| s != "/events/");
        let filter = filter_with(policy);
        assert_eq!(
            filter.check("https://ics.uci.edu/events/month/2024-05").unwrap_err(),
            Rejection::EventBrowsing
        );
        assert_eq!(
            filter.check("https://ics.uci.edu/events/list/").unwrap_err(),
            Rejection::EventBrowsing
        );
        assert!(filter.is_valid("https://ics.uci.edu/events/distinguished-lecture"));
    }

    #[test]
    fn test_wiki_rules() {
        let mut policy = CrawlPolicy::default();
        for key in ["do", "idx"] {
            policy.trap_query_keys.remove(key);
        }
        let filter = filter_with(policy);
        let base = "https://wiki.ics.uci.edu/doku.php";
        assert_eq!(
            filter.check(&format!("{base}?id=start&do=revisions")).unwrap_err(),
            Rejection::WikiAction
        );
        assert_eq!(
            filter.check(&format!("{base}?id=start&rev=1600000000")).unwrap_err(),
            Rejection::WikiAction
        );
        assert_eq!(
            filter.check(&format!("{base}?idx=projects")).unwrap_err(),
            Rejection::WikiAction
        );
        assert!(filter.is_valid(&format!("{base}?id=start&idx=projects")));
        assert!(filter.is_valid(&format!("{base}?id=start&do=edit")));
        // blocked actions match exactly
        assert!(filter.is_valid(&format!("{base}?id=start&do=Revisions")));
        assert!(filter.is_valid(&format!("{base}?id=start")));
    }

    #[test]
    fn test_variant_budget_charged_even_when_rejected_later() {
        let filter = filter();
        for i in 0..50 {
            assert!(!filter.is_valid(&format!("https://ics.uci.edu/file.pdf?id={i}")));
        }
        assert_eq!(
            filter.check("https://ics.uci.edu/file.pdf?id=50").unwrap_err(),
            Rejection::TooManyVariants
        );
        assert_eq!(filter.traps().variants().variants_for("ics.uci.edu", "/file.pdf"), 51);
    }
}
