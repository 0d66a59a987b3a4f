use async_trait::async_trait;
use gleaner_common::Result;

use crate::types::SearchHit;

/// Upstream web search.
///
/// Implementations return hits in the provider's own ranking and never more
/// than `count`. An empty list is a valid answer, not an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
