use causeway_config::CausewayConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn loads_twitter_secrets_with_env_expansion() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
version: "1"
twitter:
  consumer_key: "${CW_TEST_TW_KEY}"
  consumer_secret: "${CW_TEST_TW_SECRET}"
"#;
    let p = write_yaml(&tmp, "causeway.yaml", file_yaml);

    temp_env::with_vars(
        [
            ("CW_TEST_TW_KEY", Some("key-from-env")),
            ("CW_TEST_TW_SECRET", Some("secret-from-env")),
        ],
        || {
            let cfg = CausewayConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");

            let twitter = cfg.twitter().expect("twitter namespace present");
            assert_eq!(twitter.consumer_key, "key-from-env");
            assert_eq!(twitter.consumer_secret, "secret-from-env");
        },
    );
}

#[test]
#[serial]
fn missing_twitter_namespace_is_a_startup_error() {
    let cfg = CausewayConfigLoader::new()
        .with_yaml_str("version: '1'")
        .load()
        .expect("config without twitter still loads");

    let err = cfg.twitter().expect_err("twitter access must fail");
    assert!(err.to_string().contains("twitter"));
}

#[test]
#[serial]
fn env_overrides_win_over_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "causeway.yaml", "version: 'from-file'");

    temp_env::with_var("CAUSEWAY_VERSION", Some("from-env"), || {
        let cfg = CausewayConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");
        assert_eq!(cfg.version.as_deref(), Some("from-env"));
    });
}
