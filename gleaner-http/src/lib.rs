//! Minimal HTTP client with safe logging, per-request timeouts and query-key auth.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - Every request takes an absolute URL
//! - JSON (`get_json`) and markup/text (`get_text`) helpers; text bodies are
//!   decoded with the charset the server declares
//! - Redacts sensitive query params and never logs secret values
//! - Optional *raw* request/response logging via `GLEANER_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), gleaner_http::HttpError> {
//! let client = gleaner_http::HttpClient::unanchored()?;
//! let got: serde_json::Value = client
//!     .get_json("https://api.example.com/v1/items", gleaner_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Requests are never retried: a failed send, a timeout or a non-2xx status is
//! returned to the caller immediately.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `GLEANER_HTTP_RAW=1`.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Conventional desktop browser user agent; many sites refuse bare clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "GLEANER_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let mut v = val.to_str().unwrap_or("").to_string();
        if name.as_str().eq_ignore_ascii_case("authorization") {
            v = "<redacted>".into();
        }
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    let (host_path, query) = redact_query(url);
    let query = query
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let scheme = url.scheme();
    if query.is_empty() {
        parts.push(format!("'{scheme}://{host_path}'"));
    } else {
        parts.push(format!("'{scheme}://{host_path}?{query}'"));
    }
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "apikey"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("{0}")]
    Network(String),
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("HTTP {status} from {url}: {message}")]
    Api {
        status: StatusCode,
        url: String,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Timeout { .. })
    }

    /// Status code for `Api` errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use gleaner_http::Auth;
/// use std::borrow::Cow;
///
/// let Auth::Query { name, .. } = Auth::Query { name: "key", value: Cow::Borrowed("secret") };
/// assert_eq!(name, "key");
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Auth via query param (e.g. Google `key=`); the value is never logged.
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use gleaner_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Query {
///         name: "key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.map(|t| t.as_secs()), Some(30));
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("q", "term".into())]
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client; every request URL must be absolute.
    ///
    /// ```no_run
    /// use gleaner_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::unanchored()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(10));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn unanchored() -> Result<Self, HttpError> {
        Self::build(DEFAULT_USER_AGENT)
    }

    fn build(user_agent: &str) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(10),
        })
    }

    /// Override the default timeout returned by [`HttpClient::unanchored`].
    ///
    /// ```no_run
    /// use gleaner_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::unanchored()?.with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Rebuild the underlying connection pool with a different user agent.
    pub fn with_user_agent(self, user_agent: &str) -> Result<Self, HttpError> {
        let timeout = self.default_timeout;
        Ok(Self::build(user_agent)?.with_timeout(timeout))
    }

    // ==============================
    // Public API
    // ==============================

    /// GET JSON with per-request options (headers/query/auth/timeout).
    pub async fn get_json<T>(&self, url: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let sent = self.execute(Method::GET, url, opts).await?;
        let bytes = sent
            .resp
            .bytes()
            .await
            .map_err(|err| classify_send_error(&sent.req_id, &sent.url, sent.timeout, err))?;
        log_body(&sent.req_id, &bytes);

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            let snippet = snip_body(&bytes);
            tracing::warn!(
                req_id=%sent.req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e.to_string(),
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// GET a text body (HTML, plain text), decoded with the charset from
    /// `Content-Type` and UTF-8 when none is declared.
    pub async fn get_text(&self, url: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let sent = self.execute(Method::GET, url, opts).await?;
        let text = sent
            .resp
            .text()
            .await
            .map_err(|err| classify_send_error(&sent.req_id, &sent.url, sent.timeout, err))?;
        log_body(&sent.req_id, text.as_bytes());
        Ok(text)
    }

    // ==============================
    // Core request implementation
    // ==============================

    /// Send the request and check the status; the body of a 2xx response is
    /// left unread for the caller to decode.
    async fn execute(
        &self,
        method: Method,
        raw_url: &str,
        opts: RequestOpts<'_>,
    ) -> Result<Sent, HttpError> {
        let url = Url::parse(raw_url).map_err(|e| HttpError::Url(e.to_string()))?;

        // ----- Build request -----
        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        rb = rb.timeout(timeout);

        let mut query = opts.query.clone().unwrap_or_default();
        if let Some(Auth::Query { name, value }) = &opts.auth {
            query.push((*name, value.clone()));
        }
        if !query.is_empty() {
            let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        // ----- Safe request logging (pre-send) -----
        let auth_kind = if opts.auth.is_some() { "query" } else { "none" };

        let redacted_q: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| {
                let shown = if is_secret_param(k) {
                    "<redacted>".to_string()
                } else {
                    v.as_ref().to_string()
                };
                ((*k).to_string(), shown)
            })
            .collect();

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%host_path,
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            "http.request.start"
        );

        if raw_enabled() {
            let merged = opts.headers.clone().unwrap_or_default();
            let mut raw_url = url.clone();
            if !query.is_empty() {
                raw_url
                    .query_pairs_mut()
                    .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_ref())));
            }
            let curl = make_curl(&method, &raw_url, &merged);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|err| classify_send_error(&req_id, &url, timeout, err))?;
        let status = resp.status();
        let headers = resp.headers();

        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=t0.elapsed().as_millis() as u64,
            content_len=?resp.content_length(),
            content_type=?headers.get(reqwest::header::CONTENT_TYPE),
            x_request_id=%req_hdr_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(headers);
            tracing::info!(target:"http.raw", %req_id, status=%status, headers=?hdrs, "response");
        }

        if status.is_success() {
            return Ok(Sent {
                req_id,
                url,
                timeout,
                resp,
            });
        }

        let bytes = resp.bytes().await.unwrap_or_default();
        log_body(&req_id, &bytes);
        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            host_path=%host_path,
            message=%message,
            x_request_id=%req_hdr_id,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            url: host_path,
            message,
            request_id: req_hdr_id,
        })
    }
}

/// A 2xx response whose body has not been read yet.
struct Sent {
    req_id: String,
    url: Url,
    timeout: Duration,
    resp: Response,
}

// ==============================
// Helpers
// ==============================

fn classify_send_error(req_id: &str, url: &Url, timeout: Duration, err: reqwest::Error) -> HttpError {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    if err.is_timeout() {
        tracing::warn!(
            req_id=%req_id,
            host_path=%host_path,
            timeout_ms=timeout.as_millis() as u64,
            "http.timeout"
        );
        return HttpError::Timeout {
            url: host_path,
            timeout_ms: timeout.as_millis() as u64,
        };
    }
    let message = err.to_string();
    tracing::warn!(
        req_id=%req_id,
        host_path=%host_path,
        message=%message,
        "http.network_error"
    );
    HttpError::Network(message)
}

fn extract_error_message(body: &[u8]) -> String {
    // Google / OpenAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let snip = String::from_utf8_lossy(body);
    if snip.chars().count() > 500 {
        let mut short: String = snip.chars().take(500).collect();
        short.push_str("...");
        short
    } else {
        snip.into_owned()
    }
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    // Return "host + path" string and redacted query list for logging
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = v.to_string();
            let secret = is_secret_param(&k);
            (k, if secret { "<redacted>".into() } else { v })
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

fn log_body(req_id: &str, body: &[u8]) {
    if raw_enabled() {
        let truncated = body.len() > RAW_MAX_BODY;
        let text = String::from_utf8_lossy(&body[..body.len().min(RAW_MAX_BODY)]);
        tracing::info!(target:"http.raw", %req_id, body=%text, truncated, "response.body");
    }
    tracing::trace!(
        req_id=%req_id,
        body_len=body.len(),
        body_snippet=%snip_body(body),
        "http.response.body_snippet"
    );
}
