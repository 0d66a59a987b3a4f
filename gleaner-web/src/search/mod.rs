//! Search provider seam plus the aggregator that enriches each hit.

mod aggregator;
mod google;
mod provider;

pub use aggregator::{MAX_RESULTS, SearchAggregator};
pub use google::GoogleSearchProvider;
pub use provider::SearchProvider;
