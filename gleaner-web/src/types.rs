use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gleaner_common::GleanerError;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Title used whenever a page (or search hit) carries none.
pub const NO_TITLE: &str = "No title found";

/// What the caller wants out of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Extract and also run the summary/keyword pass.
    #[default]
    Summarize,
    /// Extract only.
    Extract,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Summarize => f.write_str("summarize"),
            Intent::Extract => f.write_str("extract"),
        }
    }
}

impl FromStr for Intent {
    type Err = GleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summarize" | "summarise" => Ok(Intent::Summarize),
            "extract" => Ok(Intent::Extract),
            other => Err(GleanerError::Validation(format!("unknown intent: {other}"))),
        }
    }
}

/// A URL to acquire plus the intent to acquire it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub url: String,
    pub intent: Intent,
}

impl FetchTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            intent: Intent::default(),
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = intent;
        self
    }
}

/// Structured content extracted from one page.
///
/// `summary` and `keywords` are only present when the primary parser
/// succeeded for a [`Intent::Summarize`] target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub title: String,
    pub text: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl Document {
    /// Minimal document built from a search hit when its page could not be
    /// extracted.
    pub fn from_hit(hit: &SearchHit) -> Self {
        let title = hit.title.trim();
        Self {
            title: if title.is_empty() {
                NO_TITLE.to_string()
            } else {
                title.to_string()
            },
            text: normalize(&hit.snippet),
            url: hit.link.clone(),
            authors: Vec::new(),
            publish_date: None,
            summary: None,
            keywords: None,
        }
    }
}

/// One raw item as returned by a search provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

/// Enriched search results, in provider order.
pub type SearchResult = Vec<Document>;

/// A single fact mined from text, e.g. `1 USD = IDR 15,750.25`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFact {
    pub value: String,
    pub rate: f64,
    pub source_url: String,
}
