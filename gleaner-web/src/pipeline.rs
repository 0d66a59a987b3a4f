//! Public façade: `acquire` and `search`, each returning a [`PipelineResult`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use gleaner_common::{GleanerError, PipelineResult, Result};
use gleaner_config::GleanerConfig;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::extract::DocumentExtractor;
use crate::fetch::HttpPageFetcher;
use crate::search::{GoogleSearchProvider, SearchAggregator, SearchProvider};
use crate::types::{Document, FetchTarget, SearchResult};

/// Entry point for every acquisition. Cheap to clone; clones share the
/// cancellation token.
#[derive(Clone)]
pub struct Pipeline {
    extractor: DocumentExtractor,
    aggregator: SearchAggregator,
    default_results: usize,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(extractor: DocumentExtractor, aggregator: SearchAggregator) -> Self {
        Self {
            extractor,
            aggregator,
            default_results: 5,
            cancel: CancellationToken::new(),
        }
    }

    /// Wire the HTTP fetcher and, when credentials resolve, the Google provider.
    pub fn from_config(config: &GleanerConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpPageFetcher::new(&config.fetch)?);
        let extractor =
            DocumentExtractor::new(fetcher).with_max_fallback_chars(config.fetch.max_fallback_chars);

        let timeout = Duration::from_secs(config.fetch.timeout_secs);
        let provider = GoogleSearchProvider::from_config(&config.search, timeout)?
            .map(|p| Arc::new(p) as Arc<dyn SearchProvider>);
        if provider.is_none() {
            tracing::warn!(target: "web.pipeline", "search credentials not configured; search disabled");
        }

        let aggregator = SearchAggregator::new(provider, extractor.clone())
            .with_max_concurrency(config.fetch.max_concurrency);

        Ok(Self::new(extractor, aggregator)
            .with_default_results(usize::from(config.search.default_results)))
    }

    pub fn with_default_results(mut self, n: usize) -> Self {
        self.default_results = n;
        self
    }

    /// Share an outer token (e.g. the runtime's) so shutdown cancels calls.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn default_results(&self) -> usize {
        self.default_results
    }

    /// Acquire one page with the default intent.
    pub async fn acquire(&self, url: &str) -> PipelineResult<Document> {
        self.acquire_target(FetchTarget::new(url)).await
    }

    pub async fn acquire_target(&self, target: FetchTarget) -> PipelineResult<Document> {
        self.guarded("acquire", async move {
            let url = validate_url(&target.url)?;
            let request = FetchTarget {
                url: url.to_string(),
                intent: target.intent,
            };
            let mut doc = self.extractor.try_extract(&request).await?;
            doc.url = target.url;
            Ok(doc)
        })
        .await
    }

    /// Search and enrich up to `n` results (clamped to 10).
    pub async fn search(&self, query: &str, n: usize) -> PipelineResult<SearchResult> {
        self.guarded("search", self.aggregator.try_search(query, n)).await
    }

    /// Run `fut` so that cancellation, panics and errors all end in a `Failure`.
    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> PipelineResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return PipelineResult::failure(&GleanerError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(GleanerError::Cancelled),
            res = AssertUnwindSafe(fut).catch_unwind() => match res {
                Ok(inner) => inner,
                Err(panic) => Err(GleanerError::Internal(panic_message(panic.as_ref()))),
            },
        };

        match &outcome {
            Ok(_) => tracing::info!(target: "web.pipeline", op, "pipeline.success"),
            Err(err) => tracing::warn!(
                target: "web.pipeline",
                op,
                kind = %err.kind(),
                error = %err,
                "pipeline.failure"
            ),
        }
        outcome.into()
    }
}

/// Accept only absolute `http`/`https` URLs with a host.
///
/// The original string is echoed back on the resulting document; the parsed
/// form is only used for the request.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(GleanerError::Validation(format!(
            "invalid url: {trimmed:?} must start with http:// or https://"
        )));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| GleanerError::Validation(format!("invalid url: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(GleanerError::Validation(format!(
            "invalid url: {trimmed:?} has no host"
        )));
    }
    Ok(url)
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic without message".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(validate_url("https://example.com/a?b=c").is_ok());
        assert!(validate_url("  HTTP://example.com  ").is_ok());

        for bad in ["not-a-url", "ftp://example.com", "example.com", "", "http://"] {
            let err = validate_url(bad).unwrap_err();
            assert_eq!(err.kind(), gleaner_common::ErrorKind::Validation, "{bad}");
            assert!(err.to_string().starts_with("invalid url"), "{bad}");
        }
    }

    #[test]
    fn panic_payloads_become_messages() {
        let caught = std::panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "boom 1");
    }
}
