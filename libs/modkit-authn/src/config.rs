//! Installation-wide authenticator configuration.
//!
//! Every authenticator has a section of the form
//!
//! ```yaml
//! authenticators:
//!   simple_bearer:
//!     enabled: true
//!     config:
//!       check_token_url: https://introspect.example/check
//! ```
//!
//! Access rules may carry their own `config` object for the same
//! authenticator. [`authenticator_config`] merges the rule object over the
//! section's `config` (rule keys win) and decodes the result into the
//! strategy's typed configuration.

use crate::{config_error::ConfigError, forward::ForwarderConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "AUTHN__";

/// Provider of per-authenticator configuration sections.
pub trait ConfigProvider: Send + Sync {
    /// Returns the section for the authenticator, if any.
    fn authenticator_section(&self, id: &str) -> Option<&AuthenticatorSection>;
}

/// Configuration section of a single authenticator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatorSection {
    /// Administrative switch; disabled authenticators fail validation
    #[serde(default)]
    pub enabled: bool,

    /// Installation-wide defaults for the strategy's typed configuration
    #[serde(default)]
    pub config: Value,
}

/// Whether the authenticator is administratively enabled.
///
/// Authenticators without a section are disabled.
#[must_use]
pub fn authenticator_is_enabled(provider: &dyn ConfigProvider, id: &str) -> bool {
    provider
        .authenticator_section(id)
        .is_some_and(|section| section.enabled)
}

/// Decode the effective configuration of an authenticator for one rule.
///
/// The rule-level object is merged over the installation-wide `config`
/// section. A `null` rule config means "no override".
///
/// # Errors
/// Returns `ConfigError::InvalidConfig` if the merged value cannot be
/// deserialized into `T`.
pub fn authenticator_config<T: DeserializeOwned>(
    provider: &dyn ConfigProvider,
    id: &str,
    rule_config: &Value,
) -> Result<T, ConfigError> {
    let base = provider
        .authenticator_section(id)
        .map_or(&Value::Null, |section| &section.config);

    let merged = merge(base, rule_config);

    serde_json::from_value(merged).map_err(|e| ConfigError::InvalidConfig {
        authenticator: id.to_owned(),
        source: e,
    })
}

/// Shallow merge: keys of `overlay` replace keys of `base` when both are
/// objects; otherwise a non-null `overlay` replaces `base` entirely.
fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base.clone(),
        (_, overlay) => overlay.clone(),
    }
}

/// Gateway configuration: authenticator sections and the outbound forwarder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub authenticators: HashMap<String, AuthenticatorSection>,

    #[serde(default)]
    pub forwarder: ForwarderConfig,
}

impl GatewayConfig {
    /// Load layered configuration:
    /// defaults, then the YAML file (if given), then `AUTHN__*` environment
    /// variables (`__` separates nested keys).
    ///
    /// # Errors
    /// Returns `ConfigError::Load` if a layer cannot be read or the merged
    /// result does not match the expected shape.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        tracing::debug!(
            authenticators = config.authenticators.len(),
            "gateway configuration loaded"
        );

        Ok(config)
    }

    /// Add or replace an authenticator section
    #[must_use]
    pub fn with_authenticator(
        mut self,
        id: impl Into<String>,
        enabled: bool,
        config: Value,
    ) -> Self {
        self.authenticators
            .insert(id.into(), AuthenticatorSection { enabled, config });
        self
    }
}

impl ConfigProvider for GatewayConfig {
    fn authenticator_section(&self, id: &str) -> Option<&AuthenticatorSection> {
        self.authenticators.get(id)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[derive(Debug, PartialEq, Deserialize)]
    struct TestConfig {
        url: String,
        #[serde(default)]
        flag: bool,
    }

    fn provider() -> GatewayConfig {
        GatewayConfig::default()
            .with_authenticator("enabled_one", true, json!({"url": "https://a", "flag": true}))
            .with_authenticator("disabled_one", false, Value::Null)
    }

    #[test]
    fn enabled_flag() {
        let provider = provider();
        assert!(authenticator_is_enabled(&provider, "enabled_one"));
        assert!(!authenticator_is_enabled(&provider, "disabled_one"));
        assert!(!authenticator_is_enabled(&provider, "missing"));
    }

    #[test]
    fn rule_config_overrides_section_keys() {
        let provider = provider();
        let config: TestConfig =
            authenticator_config(&provider, "enabled_one", &json!({"url": "https://b"})).unwrap();

        assert_eq!(
            config,
            TestConfig {
                url: "https://b".to_owned(),
                flag: true,
            }
        );
    }

    #[test]
    fn null_rule_config_uses_section() {
        let provider = provider();
        let config: TestConfig =
            authenticator_config(&provider, "enabled_one", &Value::Null).unwrap();
        assert_eq!(config.url, "https://a");
    }

    #[test]
    fn missing_section_uses_rule_config_only() {
        let provider = provider();
        let config: TestConfig =
            authenticator_config(&provider, "missing", &json!({"url": "https://c"})).unwrap();
        assert_eq!(config.url, "https://c");
        assert!(!config.flag);
    }

    #[test]
    fn undecodable_config_is_invalid() {
        let provider = provider();
        let result: Result<TestConfig, _> =
            authenticator_config(&provider, "disabled_one", &json!({"flag": "yes"}));

        match result {
            Err(ConfigError::InvalidConfig { authenticator, .. }) => {
                assert_eq!(authenticator, "disabled_one");
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn merge_rules() {
        assert_eq!(merge(&json!({"a": 1}), &json!({"b": 2})), json!({"a": 1, "b": 2}));
        assert_eq!(merge(&json!({"a": 1}), &Value::Null), json!({"a": 1}));
        assert_eq!(merge(&json!({"a": 1}), &json!("x")), json!("x"));
        assert_eq!(merge(&Value::Null, &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "authenticators:\n  simple_bearer:\n    enabled: true\n    config:\n      check_token_url: https://introspect.example/check\nforwarder:\n  timeout: 3s\n"
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        let section = config.authenticator_section("simple_bearer").unwrap();

        assert!(section.enabled);
        assert_eq!(
            section.config["check_token_url"],
            "https://introspect.example/check"
        );
        assert_eq!(config.forwarder.timeout, std::time::Duration::from_secs(3));
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let config = GatewayConfig::load(None).unwrap();
        assert_eq!(config.forwarder, ForwarderConfig::default());
    }
}
