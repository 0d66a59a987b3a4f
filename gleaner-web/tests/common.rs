use std::sync::OnceLock;

use gleaner_common::observability::{LogConfig, LogFormat};
use gleaner_config::{GleanerConfig, SearchConfig};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "gleaner-tests",
            emit_stderr: true,
            format: if std::env::var("GLEANER_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        gleaner_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Config pointing the search provider at a mock server, with a 1s fetch timeout.
#[allow(dead_code)]
pub fn config_for(server_uri: &str, with_credentials: bool) -> GleanerConfig {
    let mut config = GleanerConfig::default();
    config.search = SearchConfig {
        endpoint: format!("{server_uri}/customsearch/v1"),
        ..SearchConfig::default()
    };
    if with_credentials {
        config.search.api_key = Some("test-key".into());
        config.search.engine_id = Some("test-cx".into());
    }
    config.fetch.timeout_secs = 1;
    config.fetch.max_concurrency = 4;
    config
}

#[allow(dead_code)]
pub const ARTICLE_HTML: &str = r#"<!doctype html>
<html><head>
  <title>Rupiah holds steady | Wire</title>
  <meta name="author" content="Dewi Lestari">
  <meta property="article:published_time" content="2024-06-03T09:00:00Z">
</head><body>
  <nav><p>Markets, Currencies, Commodities, Bonds, Equities, Opinion</p></nav>
  <article>
    <h1>Rupiah holds steady</h1>
    <p>The rupiah held steady on Monday as 1 USD = 16,250.50 IDR in morning trade in Jakarta.</p>
    <p>Dealers said importers bought dollars while exporters sold, keeping the rupiah in a narrow band.</p>
    <p>Bank Indonesia has kept its policy rate unchanged, supporting the currency through the quarter.</p>
  </article>
  <script>window.analytics = "should never be indexed";</script>
</body></html>"#;
