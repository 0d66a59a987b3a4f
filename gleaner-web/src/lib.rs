//! Content acquisition and extraction.
//!
//! - Text normalization (`normalize`)
//! - Single-page extraction with a readability-style primary parser and a raw
//!   markup fallback (`extract`, `article`, `scrape`, `nlp`, `fetch`)
//! - Search with per-result enrichment (`search`)
//! - Exchange-rate fact mining over extracted text (`fact`)
//! - The [`Pipeline`] façade that turns every outcome into a
//!   [`gleaner_common::PipelineResult`]

pub mod article;
mod dom;
pub mod extract;
pub mod fact;
pub mod fetch;
pub mod nlp;
pub mod normalize;
pub mod pipeline;
pub mod scrape;
pub mod search;
pub mod types;

pub use extract::DocumentExtractor;
pub use fact::{CurrencyPair, extract_fact, extract_fact_from, scan_rate_lines};
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use normalize::normalize;
pub use pipeline::Pipeline;
pub use search::{GoogleSearchProvider, SearchAggregator, SearchProvider};
pub use types::{Document, ExtractedFact, FetchTarget, Intent, SearchHit, SearchResult};
