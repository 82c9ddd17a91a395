use std::collections::BTreeSet;

use scraper::{Html, Selector};
use url::Url;

const SKIPPED_SCHEMES: &[&str] = &["mailto:", "javascript:", "tel:"];

/// Absolute, defragmented targets of every `<a href>` on the page, resolved
/// against `final_url`. Hrefs that do not resolve are skipped.
pub fn extract_links(html: &str, final_url: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let Ok(base) = Url::parse(final_url) else {
        tracing::debug!(url = %final_url, "cannot resolve links against unparsable page URL");
        return found;
    };
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return found,
    };

    let doc = Html::parse_document(html);
    for el in doc.select(&selector) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if let Some(resolved) = resolve_href(&base, href) {
            found.insert(resolved);
        }
    }
    found
}

fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_and_defragments() {
        let html = r##"
            <a href="/about#team">About</a>
            <a href="people/">People</a>
            <a href="https://stat.uci.edu/x">Stat</a>
            <a href="#top">Top</a>
            <a href="/about">About again</a>
        "##;
        let links = extract_links(html, "https://ics.uci.edu/dept/index.html");
        let expected = [
            "https://ics.uci.edu/about",
            "https://ics.uci.edu/dept/index.html",
            "https://ics.uci.edu/dept/people/",
            "https://stat.uci.edu/x",
        ];
        assert_eq!(links.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_skips_non_navigational_and_broken_hrefs() {
        let html = r#"
            <a href="mailto:dean@uci.edu">Mail</a>
            <a href="JavaScript:void(0)">JS</a>
            <a href="tel:+19495551234">Call</a>
            <a href="   ">Blank</a>
            <a href="http://[::1">Broken</a>
            <a>No href</a>
            <a href="/ok">Ok</a>
        "#;
        let links = extract_links(html, "https://ics.uci.edu/");
        assert_eq!(links.into_iter().collect::<Vec<_>>(), ["https://ics.uci.edu/ok"]);
    }

    #[test]
    fn test_unparsable_base_yields_nothing() {
        assert!(extract_links(r#"<a href="/x">x</a>"#, "not a url").is_empty());
    }
}
