//! Bearer token strategy backed by a remote introspection endpoint.
//!
//! The inbound request is replayed against `check_token_url` with its original
//! method and headers. A 200 response is parsed as JSON and the identity is
//! read from it with two path expressions:
//!
//! ```yaml
//! check_token_url: https://introspect.example/check
//! token_from:
//!   header: X-Api-Token
//! preserve_path: false
//! subject_from: sub
//! extra_from: "@this"
//! ```

use crate::{
    authenticator::{Authenticator, ResolveConfig},
    config::{ConfigProvider, authenticator_config, authenticator_is_enabled},
    errors::{AuthnError, ForbiddenError},
    forward::SessionStoreForwarder,
    json_path::JsonPath,
    session::AuthenticationSession,
    token::{TokenLocation, bearer_token_from_request},
};
use async_trait::async_trait;
use http::request::Parts;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

pub const ID: &str = "simple_bearer";

const DEFAULT_SUBJECT_FROM: &str = "subject";
const DEFAULT_EXTRA_FROM: &str = "extra";

/// Resolved configuration of [`SimpleBearerAuthenticator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleBearerConfig {
    /// Introspection endpoint
    pub check_token_url: Url,

    /// Where the token is read from; `Authorization: Bearer` when unset
    #[serde(default)]
    pub token_from: Option<TokenLocation>,

    /// Replay the inbound path against the introspection host
    #[serde(default)]
    pub preserve_path: bool,

    /// Path expression selecting the extra claims object
    #[serde(default)]
    pub extra_from: String,

    /// Path expression selecting the subject
    #[serde(default)]
    pub subject_from: String,
}

pub struct SimpleBearerAuthenticator {
    config: Arc<dyn ConfigProvider>,
    forwarder: Arc<dyn SessionStoreForwarder>,
    paths: Arc<JsonPath>,
}

impl SimpleBearerAuthenticator {
    #[must_use]
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        forwarder: Arc<dyn SessionStoreForwarder>,
        paths: Arc<JsonPath>,
    ) -> Self {
        Self {
            config,
            forwarder,
            paths,
        }
    }

    /// Decode the value at `path` in `body`; a missing value reads as `null`.
    fn field<T: DeserializeOwned>(
        &self,
        body: &[u8],
        path: &str,
        option: &str,
    ) -> Result<T, ForbiddenError> {
        let raw = self
            .paths
            .extract_raw(body, path)
            .unwrap_or_else(|| "null".to_owned());

        serde_json::from_str(&raw).map_err(|e| {
            ForbiddenError::new(format!(
                "The configured {option} path returned an error on JSON output: {e}"
            ))
            .with_debug(format!(
                "path: {path}\nBody: {}\nResult: {raw}",
                String::from_utf8_lossy(body)
            ))
            .with_source(e)
        })
    }
}

impl ResolveConfig for SimpleBearerAuthenticator {
    type Config = SimpleBearerConfig;

    fn config(&self, raw: &Value) -> Result<SimpleBearerConfig, AuthnError> {
        let mut config: SimpleBearerConfig =
            authenticator_config(self.config.as_ref(), ID, raw)
                .map_err(|e| AuthnError::misconfigured(ID, e))?;

        if config.extra_from.is_empty() {
            DEFAULT_EXTRA_FROM.clone_into(&mut config.extra_from);
        }
        if config.subject_from.is_empty() {
            DEFAULT_SUBJECT_FROM.clone_into(&mut config.subject_from);
        }

        Ok(config)
    }
}

#[async_trait]
impl Authenticator for SimpleBearerAuthenticator {
    fn id(&self) -> &'static str {
        ID
    }

    fn validate(&self, raw: &Value) -> Result<(), AuthnError> {
        if !authenticator_is_enabled(self.config.as_ref(), ID) {
            return Err(AuthnError::not_enabled(ID));
        }
        self.config(raw).map(|_| ())
    }

    async fn authenticate(
        &self,
        request: &Parts,
        session: &mut AuthenticationSession,
        raw: &Value,
    ) -> Result<(), AuthnError> {
        let config = self.config(raw)?;

        if bearer_token_from_request(request, config.token_from.as_ref()).is_none() {
            return Err(AuthnError::NotResponsible);
        }

        let body = self
            .forwarder
            .forward(request, &config.check_token_url, config.preserve_path)
            .await?;

        let subject: Option<String> = self.field(&body, &config.subject_from, "subject_from")?;
        let extra: Option<Map<String, Value>> =
            self.field(&body, &config.extra_from, "extra_from")?;

        session.subject = subject.unwrap_or_default();
        session.extra = extra;
        Ok(())
    }
}
