use scraper::Html;

/// Elements whose text never counts as visible page content.
const HIDDEN_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "header", "footer", "nav", "aside",
];

/// Visible text of an HTML document: every text node outside the hidden
/// elements, trimmed, joined with single spaces.
pub fn extract_visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut pieces = Vec::new();

    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            pieces.push(text);
        }
    }

    pieces.join(" ")
}
