use gleaner_config::GleanerConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const NO_CREDENTIAL_ENV: [(&str, Option<&str>); 4] = [
    ("GOOGLE_API_KEY", None),
    ("GOOGLE_CSE_ID", None),
    ("GLEANER__SEARCH__API_KEY", None),
    ("GLEANER__SEARCH__ENGINE_ID", None),
];

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: 0.1
search:
  api_key: "${GOOGLE_API_KEY}"
  engine_id: "${GOOGLE_CSE_ID}"
  default_results: 3
fetch:
  timeout_secs: 4
  max_concurrency: 2
logging:
  format: json
  "#;
    let p = write_yaml(&tmp, "gleaner.yaml", file_yaml);

    temp_env::with_vars(
        [
            ("GOOGLE_API_KEY", Some("key-from-env")),
            ("GOOGLE_CSE_ID", Some("cx-from-env")),
        ],
        || {
            let config = GleanerConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load system config");

            assert_eq!(config.version.as_deref(), Some("0.1"));
            assert_eq!(config.search.default_results, 3);
            assert_eq!(config.fetch.timeout_secs, 4);
            assert_eq!(config.fetch.max_concurrency, 2);
            assert_eq!(config.fetch.max_fallback_chars, 5000);
            assert_eq!(config.logging.format, "json");

            let creds = config.search.credentials().expect("credentials");
            assert_eq!(creds.api_key, "key-from-env");
            assert_eq!(creds.engine_id, "cx-from-env");
        },
    );
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "gleaner.yaml",
        "fetch:\n  timeout_secs: 4\n  user_agent: from-file\n",
    );

    temp_env::with_vars(
        [
            ("GLEANER__FETCH__TIMEOUT_SECS", Some("7")),
            ("GLEANER__SEARCH__ENGINE_ID", Some("cx-override")),
        ],
        || {
            let config = GleanerConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env overrides");

            assert_eq!(config.fetch.timeout_secs, 7);
            assert_eq!(config.fetch.user_agent, "from-file");
            assert_eq!(config.search.engine_id.as_deref(), Some("cx-override"));
        },
    );
}

#[test]
#[serial]
fn unresolved_placeholders_mean_no_credentials() {
    temp_env::with_vars(NO_CREDENTIAL_ENV, || {
        let config = GleanerConfigLoader::new()
            .with_yaml_str(
                r#"
search:
  api_key: "${GOOGLE_API_KEY}"
  engine_id: "${GOOGLE_CSE_ID}"
"#,
            )
            .load()
            .expect("placeholders are not a load error");

        assert!(config.search.credentials().is_none());
    });
}

#[test]
#[serial]
fn well_known_variables_fill_missing_credentials() {
    temp_env::with_vars(
        [
            ("GOOGLE_API_KEY", Some("plain-key")),
            ("GOOGLE_CSE_ID", Some("plain-cx")),
            ("GLEANER__SEARCH__API_KEY", None),
            ("GLEANER__SEARCH__ENGINE_ID", None),
        ],
        || {
            let config = GleanerConfigLoader::new().load().expect("empty config");
            let creds = config.search.credentials().expect("credentials");
            assert_eq!(creds.api_key, "plain-key");
            assert_eq!(creds.engine_id, "plain-cx");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    temp_env::with_vars(NO_CREDENTIAL_ENV, || {
        let config = GleanerConfigLoader::new()
            .with_optional_file(tmp.path().join("absent.yaml"))
            .load()
            .expect("optional file may be absent");

        assert_eq!(config.search.default_results, 5);
        assert_eq!(config.fetch.max_concurrency, 10);
        assert!(config.search.credentials().is_none());
    });
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let err = GleanerConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(err.is_err());
}

#[test]
#[serial]
fn zero_timeout_is_rejected() {
    let err = GleanerConfigLoader::new()
        .with_yaml_str("fetch:\n  timeout_secs: 0\n")
        .load()
        .expect_err("zero timeout must fail");
    assert!(err.to_string().contains("timeout_secs"));
}
