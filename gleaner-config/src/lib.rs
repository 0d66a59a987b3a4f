//! Loader for Gleaner configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files (required or optional) and inline
//! YAML snippets, then `GLEANER__SECTION__KEY` environment variables. String
//! values may reference `${VAR}` placeholders, expanded recursively after the
//! merge. Search credentials missing from every source fall back to the
//! well-known `GOOGLE_API_KEY` / `GOOGLE_CSE_ID` variables.
//!
//! ```yaml
//! version: "1"
//! search:
//!   api_key: "${GOOGLE_API_KEY}"
//!   engine_id: "${GOOGLE_CSE_ID}"
//!   default_results: 5
//! fetch:
//!   timeout_secs: 10
//!   max_fallback_chars: 5000
//!   max_concurrency: 10
//! logging:
//!   format: text
//!   filter: info
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "GLEANER";
const API_KEY_ENV: &str = "GOOGLE_API_KEY";
const ENGINE_ID_ENV: &str = "GOOGLE_CSE_ID";

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub use gleaner_http::DEFAULT_USER_AGENT;

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GleanerConfig {
    #[serde(default, deserialize_with = "version_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub engine_id: Option<String>,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_results")]
    pub default_results: u8,
}

/// Resolved `(api_key, engine_id)` pair for the search provider.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

impl std::fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("api_key", &"<redacted>")
            .field("engine_id", &self.engine_id)
            .finish()
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("engine_id", &self.engine_id)
            .field("endpoint", &self.endpoint)
            .field("default_results", &self.default_results)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            endpoint: default_search_endpoint(),
            default_results: default_results(),
        }
    }
}

impl SearchConfig {
    /// Both credentials, if present and fully resolved.
    ///
    /// ```
    /// use gleaner_config::SearchConfig;
    ///
    /// let mut cfg = SearchConfig::default();
    /// assert!(cfg.credentials().is_none());
    ///
    /// cfg.api_key = Some("k".into());
    /// cfg.engine_id = Some("${GOOGLE_CSE_ID}".into());
    /// assert!(cfg.credentials().is_none());
    ///
    /// cfg.engine_id = Some("cx".into());
    /// assert_eq!(cfg.credentials().unwrap().engine_id, "cx");
    /// ```
    pub fn credentials(&self) -> Option<SearchCredentials> {
        Some(SearchCredentials {
            api_key: resolved(self.api_key.as_deref())?,
            engine_id: resolved(self.engine_id.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_fallback_chars")]
    pub max_fallback_chars: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_fallback_chars: default_max_fallback_chars(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub stderr: bool,
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: default_log_filter(),
            stderr: false,
            dir: None,
        }
    }
}

/// YAML happily reads `version: 0.1` as a float; keep whatever was written.
fn version_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn default_search_endpoint() -> String {
    DEFAULT_SEARCH_ENDPOINT.into()
}
fn default_results() -> u8 {
    5
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_max_fallback_chars() -> usize {
    5000
}
fn default_max_concurrency() -> usize {
    10
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}

/// A value counts as set only when non-blank and free of unexpanded placeholders.
fn resolved(raw: Option<&str>) -> Option<String> {
    let v = raw?.trim();
    if v.is_empty() || v.contains("${") {
        None
    } else {
        Some(v.to_string())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn apply_well_known_env(cfg: &mut GleanerConfig) {
    if resolved(cfg.search.api_key.as_deref()).is_none() {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            cfg.search.api_key = Some(key);
        }
    }
    if resolved(cfg.search.engine_id.as_deref()).is_none() {
        if let Ok(cx) = std::env::var(ENGINE_ID_ENV) {
            cfg.search.engine_id = Some(cx);
        }
    }
}

fn validate(cfg: &GleanerConfig) -> Result<(), ConfigError> {
    if !(1..=10).contains(&cfg.search.default_results) {
        return Err(ConfigError::Message(
            "search.default_results must be between 1 and 10".into(),
        ));
    }
    if cfg.fetch.timeout_secs == 0 {
        return Err(ConfigError::Message(
            "fetch.timeout_secs must be at least 1".into(),
        ));
    }
    if cfg.fetch.max_fallback_chars == 0 {
        return Err(ConfigError::Message(
            "fetch.max_fallback_chars must be at least 1".into(),
        ));
    }
    if cfg.fetch.max_concurrency == 0 {
        return Err(ConfigError::Message(
            "fetch.max_concurrency must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Conventional config file locations, most specific first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("gleaner.yaml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("gleaner").join("gleaner.yaml"));
    }
    paths
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct GleanerConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for GleanerConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GleanerConfigLoader {
    /// Start empty; environment overrides are always applied last.
    ///
    /// ```
    /// use gleaner_config::GleanerConfigLoader;
    ///
    /// let config = GleanerConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.fetch.timeout_secs, 10);
    /// assert_eq!(config.fetch.max_fallback_chars, 5000);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when absent, so deployments can rely on
    /// environment variables alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Attach every path from [`default_config_paths`] as optional. The most
    /// specific (`./gleaner.yaml`) is added last so it wins.
    pub fn with_default_files(mut self) -> Self {
        for path in default_config_paths().into_iter().rev() {
            self = self.with_optional_file(path);
        }
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use gleaner_config::GleanerConfigLoader;
    ///
    /// let cfg = GleanerConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// search:
    ///   api_key: "example-key"
    ///   engine_id: "example-cx"
    /// fetch:
    ///   timeout_secs: 3
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.fetch.timeout_secs, 3);
    /// assert_eq!(cfg.search.credentials().unwrap().api_key, "example-key");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded before materialising typed structs:
    ///
    /// ```
    /// use gleaner_config::GleanerConfigLoader;
    ///
    /// temp_env::with_var("SEARCH_KEY_FOR_DOCTEST", Some("injected-from-env"), || {
    ///     let config = GleanerConfigLoader::new()
    ///         .with_yaml_str(r#"
    /// search:
    ///   api_key: "${SEARCH_KEY_FOR_DOCTEST}"
    ///   engine_id: "cx-1"
    /// "#)
    ///         .load()
    ///         .expect("valid configuration");
    ///
    ///     let creds = config.search.credentials().expect("credentials resolved");
    ///     assert_eq!(creds.api_key, "injected-from-env");
    ///     assert_eq!(config.search.endpoint, "https://www.googleapis.com/customsearch/v1");
    /// });
    /// ```
    pub fn load(self) -> Result<GleanerConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: GleanerConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        apply_well_known_env(&mut typed);
        validate(&typed)?;

        Ok(typed)
    }
}
