//! Small helpers over `scraper` shared by the article parser and the scraper.

use scraper::{ElementRef, Html, Selector};

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(err) => {
            tracing::warn!(css, error = ?err, "web.dom.invalid_selector");
            None
        }
    }
}

pub(crate) fn select_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    parse_selector(css)
        .map(|sel| doc.select(&sel).collect())
        .unwrap_or_default()
}

pub(crate) fn select_within<'a>(el: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    parse_selector(css)
        .map(|sel| el.select(&sel).collect())
        .unwrap_or_default()
}

/// Whitespace-collapsed text of an element and its descendants.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty text among elements matching `css`.
pub(crate) fn first_text(doc: &Html, css: &str) -> Option<String> {
    select_all(doc, css)
        .into_iter()
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// First non-empty `attr` among elements matching `css`.
pub(crate) fn first_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    select_all(doc, css)
        .into_iter()
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
