use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, stream};
use gleaner_common::{GleanerError, PipelineResult, Result};

use super::provider::SearchProvider;
use crate::extract::DocumentExtractor;
use crate::pipeline::panic_message;
use crate::types::{Document, FetchTarget, SearchHit, SearchResult};

/// Upper bound on results per query; larger requests are clamped.
pub const MAX_RESULTS: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Runs a query and enriches every hit with its extracted page.
///
/// Built without a provider when credentials are missing, in which case every
/// search fails fast with a configuration error.
#[derive(Clone)]
pub struct SearchAggregator {
    provider: Option<Arc<dyn SearchProvider>>,
    extractor: DocumentExtractor,
    max_concurrency: usize,
}

impl SearchAggregator {
    pub fn new(provider: Option<Arc<dyn SearchProvider>>, extractor: DocumentExtractor) -> Self {
        Self {
            provider,
            extractor,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn try_search(&self, query: &str, n: usize) -> Result<SearchResult> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(GleanerError::credentials_missing)?;

        let query = query.trim();
        if query.is_empty() {
            return Err(GleanerError::Validation("query must not be empty".into()));
        }
        if n == 0 {
            return Err(GleanerError::Validation(
                "result count must be between 1 and 10".into(),
            ));
        }
        let count = n.min(MAX_RESULTS);

        let mut hits = provider.search(query, count).await?;
        hits.truncate(count);
        if hits.is_empty() {
            tracing::info!(target: "web.search", provider = provider.name(), query, "search.no_results");
            return Err(GleanerError::NoResults);
        }

        let width = self.max_concurrency.min(hits.len());
        tracing::debug!(
            target: "web.search",
            provider = provider.name(),
            query,
            hit_count = hits.len(),
            width,
            "search.enrich.start"
        );

        // `buffered` keeps provider order while running up to `width` fetches.
        let docs: Vec<Document> = stream::iter(hits.into_iter().map(|hit| self.enrich(hit)))
            .buffered(width)
            .collect()
            .await;

        tracing::info!(target: "web.search", query, documents = docs.len(), "search.done");
        Ok(docs)
    }

    pub async fn search(&self, query: &str, n: usize) -> PipelineResult<SearchResult> {
        self.try_search(query, n).await.into()
    }

    /// Extract one hit's page; any error or panic leaves the hit's own fields.
    async fn enrich(&self, hit: SearchHit) -> Document {
        let target = FetchTarget::new(hit.link.as_str());
        let outcome = AssertUnwindSafe(self.extractor.try_extract(&target))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(GleanerError::Internal(panic_message(panic.as_ref()))));
        match outcome {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(
                    target: "web.search",
                    url = %hit.link,
                    kind = %err.kind(),
                    error = %err,
                    "search.enrich.fallback_to_hit"
                );
                Document::from_hit(&hit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageFetcher;
    use async_trait::async_trait;
    use gleaner_common::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        hits: Vec<SearchHit>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(&self, _query: &str, count: usize) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.iter().take(count).cloned().collect())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Serves a tiny page for every URL except those containing `down`;
    /// `boom` hosts panic mid-fetch.
    struct FlakyFetcher;

    #[async_trait]
    impl PageFetcher for FlakyFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            if url.contains("boom") {
                panic!("fetcher blew up on {url}");
            }
            if url.contains("down") {
                return Err(GleanerError::Network(format!("connection refused: {url}")));
            }
            Ok(format!("<html><head><title>{url}</title></head><body>page</body></html>"))
        }
    }

    fn hit(i: usize, host: &str) -> SearchHit {
        SearchHit {
            title: format!("Hit {i}"),
            snippet: format!("snippet {i}"),
            link: format!("https://{host}.example/{i}"),
        }
    }

    fn aggregator(hits: Vec<SearchHit>) -> (SearchAggregator, Arc<FixedProvider>) {
        let provider = Arc::new(FixedProvider {
            hits,
            calls: AtomicUsize::new(0),
        });
        let extractor = DocumentExtractor::new(Arc::new(FlakyFetcher));
        (
            SearchAggregator::new(Some(provider.clone()), extractor).with_max_concurrency(2),
            provider,
        )
    }

    #[tokio::test]
    async fn unreachable_items_are_synthesized_in_place() {
        let (agg, _) = aggregator(vec![hit(0, "up"), hit(1, "down"), hit(2, "up")]);
        let docs = agg.try_search("rupiah", 3).await.unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].title, "https://up.example/0");
        assert_eq!(docs[1].title, "Hit 1");
        assert_eq!(docs[1].text, "snippet 1");
        assert_eq!(docs[1].url, "https://down.example/1");
        assert_eq!(docs[2].url, "https://up.example/2");
    }

    #[tokio::test]
    async fn panicking_item_does_not_sink_its_siblings() {
        let (agg, _) = aggregator(vec![hit(0, "up"), hit(1, "boom"), hit(2, "up")]);
        let docs = agg.try_search("rupiah", 3).await.unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].title, "https://up.example/0");
        assert_eq!(docs[1].title, "Hit 1");
        assert_eq!(docs[1].text, "snippet 1");
        assert_eq!(docs[2].title, "https://up.example/2");
    }

    #[tokio::test]
    async fn count_is_clamped_and_zero_rejected() {
        let hits = (0..15).map(|i| hit(i, "up")).collect();
        let (agg, provider) = aggregator(hits);

        assert_eq!(agg.try_search("q", 50).await.unwrap().len(), MAX_RESULTS);
        assert_eq!(agg.try_search("q", 3).await.unwrap().len(), 3);

        let zero = agg.search("q", 0).await;
        assert_eq!(zero.kind(), Some(ErrorKind::Validation));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_provider_answer_is_no_results() {
        let (agg, _) = aggregator(Vec::new());
        let res = agg.search("nothing here", 5).await;
        assert_eq!(res.kind(), Some(ErrorKind::NoResults));
        assert_eq!(res.message(), Some("no results found"));
    }

    #[tokio::test]
    async fn missing_provider_fails_fast() {
        let agg = SearchAggregator::new(None, DocumentExtractor::new(Arc::new(FlakyFetcher)));
        let res = agg.search("usd idr", 2).await;
        assert_eq!(res.kind(), Some(ErrorKind::Configuration));
        assert_eq!(res.message(), Some("credentials not configured"));
    }
}
