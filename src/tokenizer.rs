//! Word tokenization for page analytics.
//!
//! Tokens are maximal runs of ASCII letters and digits in the lowercased
//! text. Everything else is a separator, so apostrophes and hyphens split
//! words. Tokens made only of digits are discarded.

use std::sync::Arc;

use crate::config::CrawlPolicy;

pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            current.push(ch);
        } else if !current.is_empty() {
            flush(&mut tokens, &mut current);
        }
    }
    if !current.is_empty() {
        flush(&mut tokens, &mut current);
    }

    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    let token = std::mem::take(current);
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        tokens.push(token);
    }
}

/// Tokens of one page, split into the views analytics needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageWords {
    /// Every token, stopwords included; its length is the page word count
    pub all: Vec<String>,
    pub content: Vec<String>,
    pub stopwords: Vec<String>,
}

impl PageWords {
    pub fn word_count(&self) -> usize {
        self.all.len()
    }
}

/// Classifies tokens as stopwords, content words, or neither.
#[derive(Debug, Clone)]
pub struct WordFilter {
    policy: Arc<CrawlPolicy>,
}

impl WordFilter {
    pub fn new(policy: Arc<CrawlPolicy>) -> Self {
        Self { policy }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.policy.stopwords.contains(token)
    }

    pub fn is_content_word(&self, token: &str) -> bool {
        token.len() >= 2
            && !self.is_stopword(token)
            && !self.policy.noise_words.contains(token)
            && !token.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn split(&self, text: &str) -> PageWords {
        let all = tokenize(text);
        let mut content = Vec::new();
        let mut stopwords = Vec::new();
        for token in &all {
            if self.is_stopword(token) {
                stopwords.push(token.clone());
            } else if self.is_content_word(token) {
                content.push(token.clone());
            }
        }
        PageWords {
            all,
            content,
            stopwords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_punctuation_and_drops_digit_tokens() {
        assert_eq!(
            tokenize("Don't stop-me now: 2024 R2D2, CS-121!"),
            vec!["don", "t", "stop", "me", "now", "r2d2", "cs"]
        );
    }

    #[test]
    fn test_non_ascii_letters_are_separators() {
        assert_eq!(tokenize("café naïve"), vec!["caf", "na", "ve"]);
    }

    #[test]
    fn test_empty_and_separator_only_text() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" -- ... 123 456 ").is_empty());
    }

    #[test]
    fn test_split_partitions_views() {
        let filter = WordFilter::new(Arc::new(CrawlPolicy::default()));
        let words = filter.split("The crawler and THE frontier x http 42");
        assert_eq!(words.word_count(), 7);
        assert_eq!(words.content, vec!["crawler", "frontier"]);
        assert_eq!(words.stopwords, vec!["the", "and", "the"]);
    }
}
