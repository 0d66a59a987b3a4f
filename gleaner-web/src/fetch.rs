//! Page download behind a trait so extraction can be exercised without a network.

use std::time::Duration;

use async_trait::async_trait;
use gleaner_common::{GleanerError, Result};
use gleaner_config::FetchConfig;
use gleaner_http::{HttpClient, HttpError, RequestOpts};

/// Downloads the raw markup of one page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher with the configured user agent and timeouts.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = HttpClient::unanchored()
            .and_then(|c| c.with_user_agent(&config.user_agent))
            .map_err(map_http_error)?
            .with_timeout(Duration::from_secs(config.timeout_secs));
        Ok(Self { client })
    }

    pub fn from_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.client
            .get_text(url, RequestOpts::default())
            .await
            .map_err(map_http_error)
    }
}

/// Fold transport errors into the pipeline's taxonomy.
pub(crate) fn map_http_error(err: HttpError) -> GleanerError {
    match err {
        HttpError::Url(msg) => GleanerError::Validation(format!("invalid url: {msg}")),
        HttpError::Decode(msg, _) => GleanerError::Parse(msg),
        HttpError::Build(msg) => GleanerError::Internal(msg),
        other => GleanerError::Network(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_common::ErrorKind;

    #[test]
    fn transport_errors_map_to_kinds() {
        let timeout = HttpError::Timeout {
            url: "https://slow.example".into(),
            timeout_ms: 10,
        };
        let mapped = map_http_error(timeout);
        assert_eq!(mapped.kind(), ErrorKind::Network);
        assert!(mapped.to_string().contains("timed out"));

        assert_eq!(
            map_http_error(HttpError::Url("relative URL without a base".into())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            map_http_error(HttpError::Decode("eof".into(), "".into())).kind(),
            ErrorKind::Parse
        );
    }
}
