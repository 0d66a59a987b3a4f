use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use gleaner_common::Result;
use gleaner_config::{SearchConfig, SearchCredentials};
use gleaner_http::{Auth, HttpClient, RequestOpts};
use serde::Deserialize;

use super::provider::SearchProvider;
use crate::fetch::map_http_error;
use crate::types::SearchHit;

/// Google Programmable Search (Custom Search JSON API).
#[derive(Clone)]
pub struct GoogleSearchProvider {
    http: HttpClient,
    endpoint: String,
    credentials: SearchCredentials,
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

impl GoogleSearchProvider {
    pub fn new(endpoint: impl Into<String>, credentials: SearchCredentials) -> Result<Self> {
        let http = HttpClient::unanchored().map_err(map_http_error)?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    /// `None` when the configuration lacks credentials.
    pub fn from_config(config: &SearchConfig, timeout: Duration) -> Result<Option<Self>> {
        let Some(credentials) = config.credentials() else {
            return Ok(None);
        };
        let mut provider = Self::new(config.endpoint.clone(), credentials)?;
        provider.http = provider.http.with_timeout(timeout);
        Ok(Some(provider))
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>> {
        let num = count.to_string();
        let opts = RequestOpts {
            auth: Some(Auth::Query {
                name: "key",
                value: Cow::Borrowed(self.credentials.api_key.as_str()),
            }),
            query: Some(vec![
                ("cx", Cow::Borrowed(self.credentials.engine_id.as_str())),
                ("q", Cow::Borrowed(query)),
                ("num", Cow::Borrowed(num.as_str())),
            ]),
            ..Default::default()
        };

        let resp: CustomSearchResponse = self
            .http
            .get_json(&self.endpoint, opts)
            .await
            .map_err(map_http_error)?;

        tracing::debug!(
            target: "web.search",
            provider = self.name(),
            query,
            hit_count = resp.items.len(),
            "google.search.page"
        );

        let mut hits = resp.items;
        hits.truncate(count);
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> SearchCredentials {
        SearchCredentials {
            api_key: "test-key".into(),
            engine_id: "test-cx".into(),
        }
    }

    #[tokio::test]
    async fn sends_key_cx_q_num_and_reads_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("key", "test-key"))
            .and(query_param("cx", "test-cx"))
            .and(query_param("q", "usd idr"))
            .and(query_param("num", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "customsearch#search",
                "items": [
                    {"title": "A", "snippet": "first", "link": "https://a.example"},
                    {"title": "B", "snippet": "second", "link": "https://b.example", "displayLink": "b.example"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            GoogleSearchProvider::new(format!("{}/customsearch/v1", server.uri()), creds()).unwrap();
        let hits = provider.search("usd idr", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].link, "https://a.example");
        assert_eq!(hits[1].snippet, "second");
    }

    #[tokio::test]
    async fn missing_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "customsearch#search",
                "searchInformation": {"totalResults": "0"}
            })))
            .mount(&server)
            .await;

        let provider = GoogleSearchProvider::new(server.uri(), creds()).unwrap();
        assert!(provider.search("nothing", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quota_errors_surface_as_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Quota exceeded"}
            })))
            .mount(&server)
            .await;

        let provider = GoogleSearchProvider::new(server.uri(), creds()).unwrap();
        let err = provider.search("usd", 1).await.unwrap_err();
        assert_eq!(err.kind(), gleaner_common::ErrorKind::Network);
        assert!(err.to_string().contains("Quota exceeded"));
    }
}
