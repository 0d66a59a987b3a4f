//! Two-tier document extraction: structured parse first, raw scrape second.

use std::sync::Arc;

use gleaner_common::{PipelineResult, Result};

use crate::article;
use crate::fetch::PageFetcher;
use crate::nlp;
use crate::scrape;
use crate::types::{Document, FetchTarget, Intent};

pub const DEFAULT_MAX_FALLBACK_CHARS: usize = 5000;

/// Fetches one URL and turns its markup into a [`Document`].
#[derive(Clone)]
pub struct DocumentExtractor {
    fetcher: Arc<dyn PageFetcher>,
    max_fallback_chars: usize,
}

impl DocumentExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            max_fallback_chars: DEFAULT_MAX_FALLBACK_CHARS,
        }
    }

    pub fn with_max_fallback_chars(mut self, max_chars: usize) -> Self {
        self.max_fallback_chars = max_chars;
        self
    }

    /// Download, then parse. A primary parse failure falls through to the
    /// scraper on the same body; a failed download gets one more fetch that
    /// goes straight to the scraper, and only its error is returned.
    pub async fn try_extract(&self, target: &FetchTarget) -> Result<Document> {
        tracing::debug!(url = %target.url, intent = %target.intent, "web.extract.start");
        match self.fetcher.fetch(&target.url).await {
            Ok(html) => return Ok(self.extract_from_html(target, &html)),
            Err(err) => {
                tracing::debug!(url = %target.url, kind = %err.kind(), error = %err, "web.extract.primary_fetch_failed");
            }
        }

        let html = self.fetcher.fetch(&target.url).await.inspect_err(|err| {
            tracing::warn!(url = %target.url, kind = %err.kind(), error = %err, "web.extract.fetch_failed");
        })?;
        Ok(self.scrape(target, &html))
    }

    /// Parse already-downloaded markup.
    pub fn extract_from_html(&self, target: &FetchTarget, html: &str) -> Document {
        match article::parse(html) {
            Ok(parsed) => {
                let mut doc = parsed.into_document(&target.url);
                if target.intent == Intent::Summarize {
                    let digest = nlp::digest(&doc.title, &doc.text);
                    doc.summary = Some(digest.summary);
                    doc.keywords = Some(digest.keywords);
                }
                tracing::debug!(
                    url = %target.url,
                    strategy = "article",
                    text_len = doc.text.len(),
                    "web.extract.done"
                );
                doc
            }
            Err(err) => {
                tracing::debug!(url = %target.url, error = %err, "web.extract.fallback");
                self.scrape(target, html)
            }
        }
    }

    fn scrape(&self, target: &FetchTarget, html: &str) -> Document {
        let doc = scrape::scrape(html, &target.url, self.max_fallback_chars);
        tracing::debug!(
            url = %target.url,
            strategy = "scrape",
            text_len = doc.text.len(),
            "web.extract.done"
        );
        doc
    }

    pub async fn extract(&self, target: FetchTarget) -> PipelineResult<Document> {
        self.try_extract(&target).await.into()
    }
}
