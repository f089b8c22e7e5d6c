use crate::{errors::AuthnError, session::AuthenticationSession};
use async_trait::async_trait;
use http::request::Parts;
use serde_json::Value;

/// A pluggable authentication strategy.
///
/// The orchestrator picks an authenticator for each inbound request by `id`,
/// hands it the per-rule configuration blob, and lets it fill the session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Stable identifier used in rules and configuration sections
    fn id(&self) -> &str;

    /// Check that the strategy is enabled and `raw` decodes. No I/O.
    ///
    /// # Errors
    /// `NotEnabled` for an administratively disabled strategy,
    /// `Misconfigured` if the configuration cannot be resolved.
    fn validate(&self, raw: &Value) -> Result<(), AuthnError>;

    /// Authenticate `request`, writing the identity into `session` on success.
    ///
    /// The session is left untouched when an error is returned.
    ///
    /// # Errors
    /// `NotResponsible` when the request carries no credential for this
    /// strategy; any other variant is a hard failure.
    async fn authenticate(
        &self,
        request: &Parts,
        session: &mut AuthenticationSession,
        raw: &Value,
    ) -> Result<(), AuthnError>;
}

/// Typed configuration resolution of a strategy
pub trait ResolveConfig {
    type Config;

    /// Decode `raw` (merged over installation defaults) and apply defaults.
    ///
    /// # Errors
    /// `Misconfigured` if `raw` cannot be decoded.
    fn config(&self, raw: &Value) -> Result<Self::Config, AuthnError>;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Anonymous;

    #[async_trait]
    impl Authenticator for Anonymous {
        fn id(&self) -> &'static str {
            "anonymous"
        }

        fn validate(&self, _raw: &Value) -> Result<(), AuthnError> {
            Ok(())
        }

        async fn authenticate(
            &self,
            _request: &Parts,
            session: &mut AuthenticationSession,
            _raw: &Value,
        ) -> Result<(), AuthnError> {
            session.subject = "anonymous".to_owned();
            Ok(())
        }
    }

    #[tokio::test]
    async fn trait_objects_are_usable() {
        let authenticator: Arc<dyn Authenticator> = Arc::new(Anonymous);
        assert_eq!(authenticator.id(), "anonymous");
        assert!(authenticator.validate(&Value::Null).is_ok());

        let (parts, ()) = http::Request::new(()).into_parts();
        let mut session = AuthenticationSession::new();
        authenticator
            .authenticate(&parts, &mut session, &Value::Null)
            .await
            .unwrap();
        assert_eq!(session.subject, "anonymous");
    }
}
