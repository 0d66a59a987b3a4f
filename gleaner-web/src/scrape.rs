//! Raw-markup fallback: every visible text node, normalized and bounded.

use scraper::Html;

use crate::dom;
use crate::normalize::normalize;
use crate::types::{Document, NO_TITLE};

/// Subtrees whose text never reaches the reader.
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template"];

/// Build a document from raw markup. Never fails; a page with no visible text
/// yields an empty `text`.
pub fn scrape(html: &str, url: &str, max_chars: usize) -> Document {
    let doc = Html::parse_document(html);

    let mut raw = String::with_capacity(html.len() / 2);
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| INVISIBLE.contains(&e.name()));
        if !hidden {
            raw.push_str(text);
        }
    }

    let text: String = normalize(&raw).chars().take(max_chars).collect();
    let title = dom::first_text(&doc, "title").unwrap_or_else(|| NO_TITLE.to_string());

    Document {
        title,
        text,
        url: url.to_string(),
        authors: Vec::new(),
        publish_date: None,
        summary: None,
        keywords: None,
    }
}
