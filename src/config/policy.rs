//! Static crawl policy: domains, trap lists, thresholds and word lists.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "ics.uci.edu",
    "cs.uci.edu",
    "informatics.uci.edu",
    "stat.uci.edu",
];

pub const DEFAULT_TRAP_QUERY_KEYS: &[&str] = &[
    "share", "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content",
    "replytocom", "redirect_to", "do", "tab_files", "tab_details", "image", "ns", "idx",
    "outlook-ical", "ical", "calendar", "date", "year", "month", "day", "week", "start",
    "end", "from", "to", "time", "timestamp", "page", "p", "offset", "limit", "size",
    "count", "sort", "order", "filter", "search", "q", "ajax", "action", "format", "view",
    "mode", "feed", "rss", "xml", "json", "atom",
];

pub const DEFAULT_TRAP_PATH_SUBSTRINGS: &[&str] = &[
    "/wp-login",
    "/wp-admin",
    "/logout",
    "/lostpassword",
    "/mailman/admin",
    "/mailman/private",
    "/calendar",
    "/events/",
    "/event/",
    "/archive/",
    "/feed",
    "/rss",
    "/atom",
    "/xml",
    "/json",
    "/search",
    "/tag/",
    "/category/",
    "/author/",
    "/print",
    "/pdf",
    "/download",
    "/attachment",
];

pub const DEFAULT_NON_HTML_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2",
    "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf",
    "ps", "eps", "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data",
    "dat", "exe", "bz2", "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll",
    "cnf", "tgz", "sha1", "thmx", "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv",
    "swf", "wma", "zip", "rar", "gz", "apk", "ipa", "deb", "rpm", "img", "toast", "vcd",
    "txt", "ppsx", "pps", "potx", "pot", "pptm", "potm", "ppam", "ppsm",
];

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't",
    "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "few", "for",
    "from", "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having", "he",
    "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him", "himself",
    "his", "how", "how's", "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into", "is",
    "isn't", "it", "it's", "its", "itself", "let's", "me", "more", "most", "mustn't", "my",
    "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "ought",
    "our", "ours", "ourselves", "out", "over", "own", "same", "shan't", "she", "she'd",
    "she'll", "she's", "should", "shouldn't", "so", "some", "such", "than", "that",
    "that's", "the", "their", "theirs", "them", "themselves", "then", "there", "there's",
    "these", "they", "they'd", "they'll", "they're", "they've", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll",
    "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
    "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with", "won't",
    "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves",
];

/// Markup and URL residue that survives visible-text extraction but says
/// nothing about page content.
pub const DEFAULT_NOISE_WORDS: &[&str] = &[
    "http", "https", "www", "com", "org", "net", "edu", "html", "htm", "php", "aspx", "jsp",
    "nbsp", "amp", "quot", "href", "javascript",
];

pub const DEFAULT_BAD_STATUS_CODES: &[u16] = &[
    403, 404, 410, 600, 601, 602, 603, 604, 605, 606, 607,
];

pub const DEFAULT_WIKI_BLOCKED_ACTIONS: &[&str] =
    &["search", "recent", "index", "revisions", "backlink"];

pub const DEFAULT_EVENT_BROWSE_MARKERS: &[&str] = &["/day/", "/list", "/month"];

fn owned_set(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn owned_vec(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Crawl policy shared by the canonicalizer, trap detector, filter and
/// analytics aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlPolicy {
    /// Hosts equal to, or subdomains of, one of these are crawlable
    pub allowed_domains: Vec<String>,
    /// Query keys that are stripped during canonicalization and rejected by the filter
    pub trap_query_keys: HashSet<String>,
    /// Lowercased path substrings marking unbounded navigation
    pub trap_path_substrings: Vec<String>,
    /// Path extensions (without the dot) that are never HTML
    pub non_html_extensions: HashSet<String>,
    /// Pages with fewer tokens than this are neither analyzed nor expanded
    pub min_words: usize,
    /// Query parameters kept after sorting
    pub max_query_params: usize,
    /// Encoded queries longer than this are dropped entirely
    pub max_query_len: usize,
    /// Distinct raw queries tolerated per (host, path)
    pub max_variants_per_path: usize,
    pub stopwords: HashSet<String>,
    pub noise_words: HashSet<String>,
    /// Subdomains of this host are tallied in the report
    pub analytics_parent_domain: String,
    /// Response statuses that mark a URL permanently bad
    pub bad_status_codes: BTreeSet<u16>,
    /// `do=` values refused on `doku.php` endpoints
    pub wiki_blocked_actions: HashSet<String>,
    /// Sub-path markers refused below an `/events/` path
    pub event_browse_markers: Vec<String>,
    /// Entries per frequency table in the final report
    pub top_words: usize,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            allowed_domains: owned_vec(DEFAULT_ALLOWED_DOMAINS),
            trap_query_keys: owned_set(DEFAULT_TRAP_QUERY_KEYS),
            trap_path_substrings: owned_vec(DEFAULT_TRAP_PATH_SUBSTRINGS),
            non_html_extensions: owned_set(DEFAULT_NON_HTML_EXTENSIONS),
            min_words: 50,
            max_query_params: 6,
            max_query_len: 120,
            max_variants_per_path: 50,
            stopwords: owned_set(DEFAULT_STOPWORDS),
            noise_words: owned_set(DEFAULT_NOISE_WORDS),
            analytics_parent_domain: "uci.edu".to_string(),
            bad_status_codes: DEFAULT_BAD_STATUS_CODES.iter().copied().collect(),
            wiki_blocked_actions: owned_set(DEFAULT_WIKI_BLOCKED_ACTIONS),
            event_browse_markers: owned_vec(DEFAULT_EVENT_BROWSE_MARKERS),
            top_words: 50,
        }
    }
}

impl CrawlPolicy {
    /// Lowercase every case-insensitive list so lookups can compare directly.
    pub fn normalize(&mut self) {
        fn lower_set(set: &mut HashSet<String>) {
            *set = set
                .drain()
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .collect();
        }

        for domain in &mut self.allowed_domains {
            *domain = domain.trim().trim_matches('.').to_ascii_lowercase();
        }
        self.allowed_domains.retain(|d| !d.is_empty());
        for marker in self
            .trap_path_substrings
            .iter_mut()
            .chain(self.event_browse_markers.iter_mut())
        {
            *marker = marker.trim().to_ascii_lowercase();
        }
        self.trap_path_substrings.retain(|s| !s.is_empty());
        self.event_browse_markers.retain(|s| !s.is_empty());

        lower_set(&mut self.trap_query_keys);
        lower_set(&mut self.stopwords);
        lower_set(&mut self.noise_words);
        lower_set(&mut self.wiki_blocked_actions);
        self.non_html_extensions = self
            .non_html_extensions
            .drain()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.analytics_parent_domain = self
            .analytics_parent_domain
            .trim()
            .trim_matches('.')
            .to_ascii_lowercase();
    }

    pub(super) fn collect_errors(&self, errors: &mut Vec<String>) {
        if self.allowed_domains.is_empty() {
            errors.push("policy.allowed_domains must not be empty".to_string());
        }
        if self.min_words == 0 {
            errors.push("policy.min_words must be positive".to_string());
        }
        if self.max_query_params == 0 {
            errors.push("policy.max_query_params must be positive".to_string());
        }
        if self.max_query_len == 0 {
            errors.push("policy.max_query_len must be positive".to_string());
        }
        if self.max_variants_per_path == 0 {
            errors.push("policy.max_variants_per_path must be positive".to_string());
        }
        if self.top_words == 0 {
            errors.push("policy.top_words must be positive".to_string());
        }
        if self.analytics_parent_domain.is_empty() {
            errors.push("policy.analytics_parent_domain must not be empty".to_string());
        }
        for code in &self.bad_status_codes {
            if (200..=299).contains(code) {
                errors.push(format!(
                    "policy.bad_status_codes must not contain success status {code}"
                ));
            }
        }
    }

    /// True when `host` equals one of the allowed domains or is below one.
    pub fn host_allowed(&self, host: &str) -> bool {
        self.allowed_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn is_bad_status(&self, status: u16) -> bool {
        self.bad_status_codes.contains(&status)
    }
}
