//! Typed configuration for Causeway binaries.
//!
//! Sources are merged in order: YAML file(s), inline YAML snippets (tests),
//! then `CAUSEWAY_`-prefixed environment variables. `${VAR}` placeholders in
//! string values are expanded recursively before the typed structs are
//! materialised.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAX_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CausewayConfig {
    pub version: Option<String>,
    /// Secrets for the Twitter integration; absent unless configured.
    #[serde(default)]
    pub twitter: Option<TwitterSecrets>,
}

/// Consumer credentials from <https://apps.twitter.com/>, used to mint the
/// OAuth2 bearer token for API requests.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterSecrets {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl CausewayConfig {
    /// Required access to the `twitter` namespace. Erroring here is the
    /// startup failure path when the secrets are not configured.
    pub fn twitter(&self) -> Result<&TwitterSecrets, ConfigError> {
        self.twitter.as_ref().ok_or_else(|| {
            ConfigError::Message(
                "missing required `twitter` config (consumer_key, consumer_secret)".into(),
            )
        })
    }
}

/// Expand `${VAR}` placeholders in every string value, recursing into arrays
/// and objects. Expansion re-runs until it reaches a fixed point or the depth
/// cap, so variables whose values reference further variables still resolve.
/// Unknown variables are left as-is.
fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut current = std::mem::take(s);
            for _ in 0..MAX_ENV_EXPANSION_DEPTH {
                let expanded = shellexpand::env(&current)
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| current.clone());
                if expanded == current {
                    break;
                }
                current = expanded;
            }
            *s = current;
        }
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(fields) => fields.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct CausewayConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CausewayConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CausewayConfigLoader {
    /// Start an empty loader. `CAUSEWAY_`-prefixed env overrides (with `__`
    /// as the nesting separator, e.g. `CAUSEWAY_TWITTER__CONSUMER_KEY`) are
    /// appended at [`load`](Self::load) time so they win over file values.
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a config file; the `config` crate infers the format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (handy for tests and CLI overrides).
    ///
    /// ```
    /// use causeway_config::CausewayConfigLoader;
    ///
    /// let cfg = CausewayConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    /// assert_eq!(cfg.version.as_deref(), Some("1"));
    /// assert!(cfg.twitter().is_err());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<CausewayConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CAUSEWAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        // Go through serde_json::Value so ${VAR} expansion sees every string.
        let mut raw: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut raw);

        serde_json::from_value(raw).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
