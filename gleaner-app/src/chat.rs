//! Routes a free-form chat message to the pipeline.
//!
//! Exchange-rate questions search for the current quote and mine it from the
//! results; browse requests acquire the linked page; anything else gets a
//! help message.

use anyhow::Result;
use gleaner_common::{ErrorKind, PipelineResult};
use gleaner_web::{CurrencyPair, Document, Pipeline, extract_fact_from, scan_rate_lines};
use regex::Regex;
use serde::Serialize;

const RATE_RESULTS: usize = 2;
const BROWSE_PREVIEW_CHARS: usize = 500;
const BROWSE_WORDS: &[&str] = &["browse", "visit", "open"];

pub const UNKNOWN_REQUEST: &str =
    "I'm not sure how to handle that request. Try asking about exchange rates or browsing a website.";
pub const RATE_NOT_FOUND: &str = "Could not find current exchange rate information.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ExchangeRate,
    Browse(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Decide what a message asks for.
pub fn classify(message: &str) -> Route {
    let lower = message.to_lowercase();
    if lower.contains("exchange rate") || (lower.contains("usd") && lower.contains("idr")) {
        return Route::ExchangeRate;
    }

    if BROWSE_WORDS.iter().any(|w| lower.contains(w)) {
        let link = message
            .split_whitespace()
            .map(|w| w.trim_end_matches(['.', ',', ')', '!', '?']))
            .find(|w| {
                let w = w.to_ascii_lowercase();
                w.starts_with("http://") || w.starts_with("https://")
            });
        if let Some(link) = link {
            return Route::Browse(link.to_string());
        }
    }

    Route::Unknown
}

pub struct ChatRouter {
    pipeline: Pipeline,
}

impl ChatRouter {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn handle(&self, message: &str) -> Result<PipelineResult<ChatReply>> {
        let route = classify(message);
        tracing::info!(target: "app.chat", route = ?route, "chat.route");
        match route {
            Route::ExchangeRate => self.exchange_rate(&CurrencyPair::default()).await,
            Route::Browse(url) => Ok(self.browse(&url).await),
            Route::Unknown => Ok(PipelineResult::Failure {
                kind: ErrorKind::Validation,
                message: UNKNOWN_REQUEST.to_string(),
            }),
        }
    }

    /// Search for the pair's quote; regex patterns across every result first,
    /// then the line heuristic.
    pub async fn exchange_rate(&self, pair: &CurrencyPair) -> Result<PipelineResult<ChatReply>> {
        let patterns: Vec<Regex> = pair.patterns()?;
        let docs = match self.pipeline.search(&pair.search_query(), RATE_RESULTS).await {
            PipelineResult::Success(docs) => docs,
            PipelineResult::Failure {
                kind: ErrorKind::Configuration,
                message,
            } => {
                return Ok(PipelineResult::Failure {
                    kind: ErrorKind::Configuration,
                    message,
                });
            }
            PipelineResult::Failure { kind, message } => {
                tracing::warn!(target: "app.chat", %kind, %message, "chat.rate.search_failed");
                return Ok(rate_not_found());
            }
        };

        Ok(rate_reply(&docs, &patterns, pair))
    }

    async fn browse(&self, url: &str) -> PipelineResult<ChatReply> {
        self.pipeline.acquire(url).await.map(|doc| ChatReply {
            message: format!(
                "Title: {}\n\nContent: {}...",
                doc.title,
                doc.text.chars().take(BROWSE_PREVIEW_CHARS).collect::<String>()
            ),
            source: Some(doc.url),
        })
    }
}

fn rate_not_found() -> PipelineResult<ChatReply> {
    PipelineResult::Failure {
        kind: ErrorKind::NoResults,
        message: RATE_NOT_FOUND.to_string(),
    }
}

fn rate_reply(docs: &[Document], patterns: &[Regex], pair: &CurrencyPair) -> PipelineResult<ChatReply> {
    if let Some(fact) = extract_fact_from(docs, patterns, pair) {
        return PipelineResult::Success(ChatReply {
            message: format!("Current Exchange Rate:\n{}", fact.value),
            source: Some(fact.source_url),
        });
    }

    docs.iter()
        .find_map(|doc| scan_rate_lines(&doc.text, pair).map(|line| (line, &doc.url)))
        .map(|(line, url)| {
            PipelineResult::Success(ChatReply {
                message: format!("Exchange Rate Information:\n{line}"),
                source: Some(url.clone()),
            })
        })
        .unwrap_or_else(rate_not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_config::GleanerConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn doc(url: &str, text: &str) -> Document {
        Document {
            title: "t".into(),
            text: text.into(),
            url: url.into(),
            authors: Vec::new(),
            publish_date: None,
            summary: None,
            keywords: None,
        }
    }

    #[test]
    fn classifies_messages() {
        assert_eq!(classify("What's the USD to IDR exchange rate?"), Route::ExchangeRate);
        assert_eq!(classify("usd vs idr today"), Route::ExchangeRate);
        assert_eq!(
            classify("please open https://Example.com/Path."),
            Route::Browse("https://Example.com/Path".into())
        );
        assert_eq!(classify("visit the website"), Route::Unknown);
        assert_eq!(classify("tell me a joke"), Route::Unknown);
    }

    #[test]
    fn regex_strategy_beats_line_heuristic_across_results() {
        let pair = CurrencyPair::default();
        let patterns = pair.patterns().unwrap();
        let docs = vec![
            doc("https://a.example", "usd/idr rate: 15800"),
            doc("https://b.example", "1 USD = 15,750.25 IDR"),
        ];
        let reply = rate_reply(&docs, &patterns, &pair).ok().unwrap();
        assert_eq!(reply.message, "Current Exchange Rate:\n1 USD = IDR 15,750.25");
        assert_eq!(reply.source.as_deref(), Some("https://b.example"));

        let reply = rate_reply(&docs[..1], &patterns, &pair).ok().unwrap();
        assert_eq!(reply.message, "Exchange Rate Information:\nusd/idr rate: 15800");

        let none = rate_reply(&[doc("https://c.example", "weather")], &patterns, &pair);
        assert_eq!(none.message(), Some(RATE_NOT_FOUND));
    }

    #[tokio::test]
    async fn unknown_requests_get_help() {
        let router = ChatRouter::new(Pipeline::from_config(&GleanerConfig::default()).unwrap());
        let res = router.handle("hello there").await.unwrap();
        assert_eq!(res.message(), Some(UNKNOWN_REQUEST));
    }

    #[tokio::test]
    async fn exchange_rate_question_end_to_end() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", "current USD to IDR exchange rate today"))
            .and(query_param("num", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"title": "Kurs", "snippet": "kurs", "link": format!("{base}/kurs")}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/kurs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><div>Live quotes</div><div>1 USD = 16,120.75 IDR</div></body></html>",
            ))
            .mount(&server)
            .await;

        let mut config = GleanerConfig::default();
        config.search.endpoint = format!("{base}/customsearch/v1");
        config.search.api_key = Some("k".into());
        config.search.engine_id = Some("cx".into());
        let router = ChatRouter::new(Pipeline::from_config(&config).unwrap());

        let reply = router
            .handle("what is the exchange rate today?")
            .await
            .unwrap()
            .ok()
            .expect("rate found");
        assert_eq!(reply.message, "Current Exchange Rate:\n1 USD = IDR 16,120.75");
        assert_eq!(reply.source, Some(format!("{base}/kurs")));
    }
}
