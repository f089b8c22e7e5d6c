use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound forwarder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Deadline for the whole exchange, body included (e.g. `"10s"`)
    #[serde(default = "default_timeout", with = "humantime_duration")]
    pub timeout: Duration,

    /// Maximum accepted response body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Permit plain `http://` targets (local development and tests only)
    #[serde(default)]
    pub allow_insecure_http: bool,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_body_size: default_max_body_size(),
            allow_insecure_http: false,
        }
    }
}

impl ForwarderConfig {
    /// Settings for talking to local mock servers
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            allow_insecure_http: true,
            ..Self::default()
        }
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
