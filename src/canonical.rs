//! URL canonicalization.
//!
//! The canonical string is the identity of a page both for frontier
//! deduplication and for analytics, so every component that needs "the same
//! page" goes through [`Canonicalizer::canonicalize`].

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use url::{Url, form_urlencoded};

use crate::config::CrawlPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Lowercased host, when the canonical form is a parseable URL.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.0)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_ascii_lowercase()))
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CanonicalUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<CanonicalUrl> for String {
    fn from(value: CanonicalUrl) -> Self {
        value.0
    }
}

#[derive(Debug, Clone)]
pub struct Canonicalizer {
    policy: Arc<CrawlPolicy>,
}

impl Canonicalizer {
    pub fn new(policy: Arc<CrawlPolicy>) -> Self {
        Self { policy }
    }

    /// Map any URL string to its canonical form. Never fails: input the URL
    /// parser refuses gets a best-effort textual normalization instead.
    pub fn canonicalize(&self, raw: &str) -> CanonicalUrl {
        let trimmed = raw.trim();
        let defragged = trimmed.split_once('#').map_or(trimmed, |(before, _)| before);

        match Url::parse(defragged) {
            Ok(url) if !url.cannot_be_a_base() => CanonicalUrl(self.canonicalize_parsed(url)),
            _ => CanonicalUrl(self.best_effort(defragged)),
        }
    }

    fn canonicalize_parsed(&self, mut url: Url) -> String {
        url.set_fragment(None);

        // The parser already lowercases special-scheme hosts and drops their
        // default ports; opaque hosts of other schemes are lowercased here.
        if let Some(host) = url.host_str() {
            let lowered = host.to_ascii_lowercase();
            if lowered != host {
                let _ = url.set_host(Some(&lowered));
            }
        }

        let path = strip_trailing_slashes(url.path()).to_string();
        url.set_path(&path);

        let query = self.normalize_query(url.query());
        url.set_query(query.as_deref());

        url.into()
    }

    fn normalize_query(&self, query: Option<&str>) -> Option<String> {
        let params = self.select_params(
            form_urlencoded::parse(query?.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned())),
        )?;
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        self.within_length(encoded)
    }

    /// Same selection as [`Self::normalize_query`] over the raw text, for
    /// input the URL parser refused. Pairs are kept unencoded.
    fn normalize_raw_query(&self, query: &str) -> Option<String> {
        let params = self.select_params(
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )?;
        let joined = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        self.within_length(joined)
    }

    /// Drop blank values and trap keys, lowercase keys, sort, then cap the
    /// parameter count.
    fn select_params(
        &self,
        pairs: impl Iterator<Item = (String, String)>,
    ) -> Option<Vec<(String, String)>> {
        let mut params = pairs
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.to_lowercase(), value))
            .filter(|(key, _)| !self.policy.trap_query_keys.contains(key))
            .collect::<Vec<_>>();
        if params.is_empty() {
            return None;
        }
        params.sort();
        params.truncate(self.policy.max_query_params);
        Some(params)
    }

    fn within_length(&self, query: String) -> Option<String> {
        (query.len() <= self.policy.max_query_len).then_some(query)
    }

    fn best_effort(&self, raw: &str) -> String {
        let (before_query, query) = match raw.split_once('?') {
            Some((before, query)) => (before, Some(query)),
            None => (raw, None),
        };

        let (prefix, path) = match before_query.split_once("://") {
            Some((scheme, rest)) => {
                let (authority, path) = match rest.find('/') {
                    Some(idx) => rest.split_at(idx),
                    None => (rest, ""),
                };
                let scheme = scheme.to_ascii_lowercase();
                let mut authority = authority.to_ascii_lowercase();
                let default_port = match scheme.as_str() {
                    "http" => Some(":80"),
                    "https" => Some(":443"),
                    _ => None,
                };
                if let Some(stripped) = default_port.and_then(|port| authority.strip_suffix(port)) {
                    authority = stripped.to_string();
                }
                (format!("{scheme}://{authority}"), path)
            }
            None => (String::new(), before_query),
        };

        let mut out = prefix;
        out.push_str(strip_trailing_slashes(path));
        if let Some(query) = query.and_then(|q| self.normalize_raw_query(q)) {
            out.push('?');
            out.push_str(&query);
        }
        out
    }
}

fn strip_trailing_slashes(path: &str) -> &str {
    if path.is_empty() {
        return path;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonicalizer() -> Canonicalizer {
        Canonicalizer::new(Arc::new(CrawlPolicy::default()))
    }

    fn canon(raw: &str) -> String {
        canonicalizer().canonicalize(raw).into_string()
    }

    #[test]
    fn test_equivalent_forms_collapse() {
        let expected = canon("http://example.com/a");
        assert_eq!(expected, "http://example.com/a");
        assert_eq!(canon("http://Example.com:80/a/"), expected);
        assert_eq!(canon("http://example.com/a?utm_source=x"), expected);
        assert_eq!(canon("HTTP://EXAMPLE.COM/a#section-2"), expected);
    }

    #[test]
    fn test_default_https_port_and_root_path() {
        assert_eq!(canon("https://ICS.uci.edu:443"), "https://ics.uci.edu/");
        assert_eq!(canon("https://ics.uci.edu/"), "https://ics.uci.edu/");
        assert_eq!(canon("https://ics.uci.edu:8443/x/"), "https://ics.uci.edu:8443/x");
    }

    #[test]
    fn test_query_order_is_irrelevant() {
        assert_eq!(canon("http://h/p?b=2&a=1"), canon("http://h/p?a=1&b=2"));
        assert_eq!(canon("http://h/p?b=2&a=1"), "http://h/p?a=1&b=2");
    }

    #[test]
    fn test_blank_values_and_trap_keys_dropped() {
        assert_eq!(canon("http://h/p?empty=&flag&id=7&Page=3&SORT=asc"), "http://h/p?id=7");
        assert_eq!(canon("http://h/p?utm_campaign=x&share=1"), "http://h/p");
    }

    #[test]
    fn test_keys_lowercased_values_kept() {
        assert_eq!(canon("http://h/p?ID=AbC"), "http://h/p?id=AbC");
    }

    #[test]
    fn test_parameter_count_truncated_after_sorting() {
        let url = "http://h/p?h=8&g=7&f=6&e=5&d=4&c=3&b=2&a=1";
        assert_eq!(canon(url), "http://h/p?a=1&b=2&c=3&d=4&e=5&f=6");
    }

    #[test]
    fn test_overlong_query_is_dropped() {
        let url = format!("http://h/p?id={}", "x".repeat(130));
        assert_eq!(canon(&url), "http://h/p");
    }

    #[test]
    fn test_malformed_input_falls_back() {
        assert_eq!(canon("HTTP://Exa mple.COM:80/a//?x=1#frag"), "http://exa mple.com/a?x=1");
        assert_eq!(canon("relative/path/"), "relative/path");
        assert_eq!(
            canon("http://exa mple.com/a?utm_source=x&b=2&A=1&blank="),
            "http://exa mple.com/a?a=1&b=2"
        );
        assert_eq!(canon("http://exa mple.com/a?utm_source=x"), "http://exa mple.com/a");
        assert_eq!(canon(""), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "http://Example.com:80/a/",
            "https://ics.uci.edu",
            "http://h/p?b=2&a=1&utm_source=z",
            "http://h/a//?q=&x=a+b&y=%20c",
            "http://h/p?h=8&g=7&f=6&e=5&d=4&c=3&b=2&a=1",
            "https://user@host.uci.edu:8080/p/?z=%E2%9C%93",
            "mailto:someone@uci.edu",
            "HTTP://Exa mple.COM:80/a//?x=1#frag",
            "relative/path/",
            "foo://Opaque.Host/Path/",
            "http://exa mple.com/a?Z=1&y==2&=v&q?r=s",
        ];
        let canonicalizer = canonicalizer();
        for input in inputs {
            let once = canonicalizer.canonicalize(input);
            let twice = canonicalizer.canonicalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_canonical_host() {
        let url = canonicalizer().canonicalize("https://WWW.Stat.UCI.edu/x");
        assert_eq!(url.host().as_deref(), Some("www.stat.uci.edu"));
    }
}
