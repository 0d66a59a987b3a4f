//! Readability-style primary parser.
//!
//! Paragraphs are scored and credited to their parent (and, at half weight,
//! grandparent); the best-scoring container is taken as the article body.
//! Title, authors and publish date come from the usual metadata locations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gleaner_common::{GleanerError, Result};
use scraper::{ElementRef, Html};
use serde_json::Value;

use crate::dom;
use crate::types::{Document, NO_TITLE};

const MIN_PARAGRAPH_CHARS: usize = 25;
const MIN_ARTICLE_CHARS: usize = 140;
const MAX_LINK_DENSITY: f64 = 0.5;

/// Paragraphs inside these are page chrome, never article body.
const CHROME: &[&str] = &[
    "nav", "header", "footer", "aside", "form", "script", "style", "noscript", "template",
];

const AUTHOR_META: &[(&str, &str)] = &[
    (r#"meta[name="author"]"#, "content"),
    (r#"meta[property="article:author"]"#, "content"),
    (r#"meta[name="byl"]"#, "content"),
];

const AUTHOR_TEXT: &[&str] = &[
    r#"[rel="author"]"#,
    r#"[itemprop="author"] [itemprop="name"]"#,
    r#"[itemprop="author"]"#,
    ".byline-name",
    ".byline",
    ".author",
];

const DATE_ATTRS: &[(&str, &str)] = &[
    (r#"meta[property="article:published_time"]"#, "content"),
    (r#"meta[itemprop="datePublished"]"#, "content"),
    (r#"meta[name="pubdate"]"#, "content"),
    (r#"meta[name="publishdate"]"#, "content"),
    (r#"meta[name="date"]"#, "content"),
    (r#"[itemprop="datePublished"]"#, "datetime"),
    ("time[pubdate]", "datetime"),
    ("time[datetime]", "datetime"),
];

/// Keys that carry a publication date in JSON-LD blocks.
const DATE_KEYS: &[&str] = &["datePublished", "dateCreated", "uploadDate"];

/// Output of the primary parser, before it becomes a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: Option<String>,
    pub text: String,
    pub authors: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
}

impl Article {
    pub fn into_document(self, url: &str) -> Document {
        Document {
            title: self.title.unwrap_or_else(|| NO_TITLE.to_string()),
            text: self.text,
            url: url.to_string(),
            authors: self.authors,
            publish_date: self.publish_date,
            summary: None,
            keywords: None,
        }
    }
}

/// Parse an article out of `html`, or fail with [`GleanerError::Parse`] when
/// no container holds enough prose.
pub fn parse(html: &str) -> Result<Article> {
    let doc = Html::parse_document(html);
    let text = article_body(&doc).ok_or_else(|| {
        GleanerError::Parse("no article content found".to_string())
    })?;

    Ok(Article {
        title: title(&doc),
        text,
        authors: authors(&doc),
        publish_date: publish_date(&doc),
    })
}

fn in_chrome(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(|n| n.value().as_element())
        .any(|e| CHROME.contains(&e.name()))
}

fn link_density(el: ElementRef<'_>, text_len: usize) -> f64 {
    if text_len == 0 {
        return 0.0;
    }
    let linked: usize = dom::select_within(el, "a")
        .into_iter()
        .map(|a| dom::element_text(a).chars().count())
        .sum();
    linked as f64 / text_len as f64
}

fn credit<'a>(scores: &mut Vec<(ElementRef<'a>, f64)>, el: ElementRef<'a>, score: f64) {
    match scores.iter_mut().find(|(e, _)| e.id() == el.id()) {
        Some((_, s)) => *s += score,
        None => scores.push((el, score)),
    }
}

fn article_body(doc: &Html) -> Option<String> {
    let mut scores: Vec<(ElementRef<'_>, f64)> = Vec::new();
    let mut paragraphs: Vec<(ElementRef<'_>, String)> = Vec::new();

    for p in dom::select_all(doc, "p") {
        if in_chrome(p) {
            continue;
        }
        let text = dom::element_text(p);
        let len = text.chars().count();
        if len < MIN_PARAGRAPH_CHARS || link_density(p, len) > MAX_LINK_DENSITY {
            continue;
        }

        let score = 1.0 + text.matches(',').count() as f64 + (len as f64 / 100.0).min(3.0);
        if let Some(parent) = p.parent().and_then(ElementRef::wrap) {
            credit(&mut scores, parent, score);
            if let Some(grand) = parent.parent().and_then(ElementRef::wrap) {
                credit(&mut scores, grand, score / 2.0);
            }
        }
        paragraphs.push((p, text));
    }

    let (best, _) = scores
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let body = paragraphs
        .iter()
        .filter(|(p, _)| p.ancestors().any(|n| n.id() == best.id()))
        .map(|(_, t)| t.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    (body.chars().count() >= MIN_ARTICLE_CHARS).then_some(body)
}

fn title(doc: &Html) -> Option<String> {
    dom::first_attr(doc, r#"meta[property="og:title"]"#, "content")
        .or_else(|| dom::first_text(doc, "title"))
        .or_else(|| dom::first_text(doc, "h1"))
}

fn authors(doc: &Html) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();
    for (css, attr) in AUTHOR_META {
        raw.extend(
            dom::select_all(doc, css)
                .into_iter()
                .filter_map(|el| el.value().attr(attr))
                .filter(|v| !v.starts_with("http"))
                .map(str::to_string),
        );
    }
    for css in AUTHOR_TEXT {
        raw.extend(dom::select_all(doc, css).into_iter().map(dom::element_text));
    }

    let mut out: Vec<String> = Vec::new();
    for name in raw.iter().flat_map(|r| split_names(r)) {
        if !out.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            out.push(name);
        }
    }
    out
}

fn strip_by(s: &str) -> &str {
    let t = s.trim();
    match t.get(..3) {
        Some(p) if p.eq_ignore_ascii_case("by ") => t[3..].trim_start(),
        _ => t,
    }
}

fn split_names(raw: &str) -> Vec<String> {
    strip_by(raw)
        .split(',')
        .flat_map(|part| part.split(" and "))
        .map(|n| strip_by(n).trim_matches(|c: char| c.is_whitespace() || c == '|'))
        .filter(|n| {
            let len = n.chars().count();
            (2..=60).contains(&len) && !n.chars().any(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
        .collect()
}

fn publish_date(doc: &Html) -> Option<DateTime<Utc>> {
    for (css, attr) in DATE_ATTRS {
        let parsed = dom::select_all(doc, css)
            .into_iter()
            .filter_map(|el| el.value().attr(attr))
            .find_map(parse_date);
        if parsed.is_some() {
            return parsed;
        }
    }

    dom::select_all(doc, r#"script[type="application/ld+json"]"#)
        .into_iter()
        .filter_map(|s| serde_json::from_str::<Value>(&s.text().collect::<String>()).ok())
        .find_map(|v| json_ld_date(&v))
}

fn json_ld_date(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Object(obj) => DATE_KEYS
            .iter()
            .filter_map(|k| obj.get(*k).and_then(Value::as_str))
            .find_map(parse_date)
            .or_else(|| obj.get("@graph").and_then(json_ld_date)),
        Value::Array(items) => items.iter().find_map(json_ld_date),
        _ => None,
    }
}

/// RFC 3339, naive `YYYY-MM-DDTHH:MM:SS` (as UTC) or a bare date (midnight UTC).
pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let ndt = date.and_hms_opt(0, 0, 0)?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}
