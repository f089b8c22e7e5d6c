use crate::{config_error::ConfigError, forward::ForwardError};
use thiserror::Error;

/// Outcome of a failed authenticator call.
///
/// `NotResponsible` is not a rejection: it tells the orchestrator that this
/// strategy found nothing to work with and the next one should be tried.
#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("authenticator '{id}' is not enabled")]
    NotEnabled { id: String },

    #[error("authenticator '{id}' is misconfigured: {source}")]
    Misconfigured {
        id: String,
        #[source]
        source: ConfigError,
    },

    #[error("authenticator is not responsible for this request")]
    NotResponsible,

    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),

    #[error("introspection request failed: {0}")]
    Forward(#[from] ForwardError),
}

impl AuthnError {
    #[must_use]
    pub fn not_enabled(id: impl Into<String>) -> Self {
        Self::NotEnabled { id: id.into() }
    }

    #[must_use]
    pub fn misconfigured(id: impl Into<String>, source: ConfigError) -> Self {
        Self::Misconfigured {
            id: id.into(),
            source,
        }
    }

    /// True for the "try the next authenticator" sentinel
    #[must_use]
    pub fn is_not_responsible(&self) -> bool {
        matches!(self, Self::NotResponsible)
    }

    /// Deployment problems, as opposed to per-request authentication failures
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NotEnabled { .. } | Self::Misconfigured { .. })
    }
}

/// Rejection carrying a client-safe reason and an operator-only debug bundle.
///
/// `Display` renders the reason only. The debug bundle may contain the full
/// introspection response and must not be returned to untrusted callers.
#[derive(Debug, Error)]
#[error("forbidden: {reason}")]
pub struct ForbiddenError {
    reason: String,
    debug: String,
    #[source]
    source: Option<serde_json::Error>,
}

impl ForbiddenError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            debug: String::new(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = debug.into();
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: serde_json::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Human-readable reason, safe to show to the caller
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Diagnostic context for logs and operators
    #[must_use]
    pub fn debug(&self) -> &str {
        &self.debug
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for AuthnError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::response::Json;
        use serde_json::json;

        let (status, message) = match &self {
            AuthnError::NotResponsible | AuthnError::Forward(ForwardError::Rejected { .. }) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthnError::Forbidden(err) => {
                tracing::debug!(reason = err.reason(), debug = err.debug(), "request forbidden");
                (StatusCode::FORBIDDEN, err.reason().to_owned())
            }
            AuthnError::Forward(err) => {
                tracing::warn!(error = %err, "introspection endpoint unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    "introspection endpoint unavailable".to_owned(),
                )
            }
            AuthnError::NotEnabled { .. } | AuthnError::Misconfigured { .. } => {
                tracing::error!(error = %self, "authenticator configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn forbidden_display_hides_debug_bundle() {
        let err = ForbiddenError::new("subject has the wrong type")
            .with_debug("Body: {\"secret\":\"value\"}");

        assert_eq!(err.to_string(), "forbidden: subject has the wrong type");
        assert_eq!(err.reason(), "subject has the wrong type");
        assert!(err.debug().contains("secret"));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn forbidden_chains_decode_error() {
        let decode_err = serde_json::from_str::<String>("123").unwrap_err();
        let err = ForbiddenError::new("bad subject").with_source(decode_err);

        let source = err.source().expect("decode error should be chained");
        assert!(source.downcast_ref::<serde_json::Error>().is_some());
    }

    #[test]
    fn sentinel_classification() {
        assert!(AuthnError::NotResponsible.is_not_responsible());
        assert!(!AuthnError::NotResponsible.is_configuration_error());

        let disabled = AuthnError::not_enabled("simple_bearer");
        assert!(disabled.is_configuration_error());
        assert!(!disabled.is_not_responsible());
        assert_eq!(
            disabled.to_string(),
            "authenticator 'simple_bearer' is not enabled"
        );

        let forbidden = AuthnError::from(ForbiddenError::new("nope"));
        assert!(!forbidden.is_not_responsible());
        assert!(!forbidden.is_configuration_error());
    }

    #[cfg(feature = "axum-ext")]
    mod responses {
        use super::*;
        use axum::body::to_bytes;
        use axum::http::StatusCode;
        use axum::response::IntoResponse;

        async fn body_of(err: AuthnError) -> (StatusCode, serde_json::Value) {
            let response = err.into_response();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        }

        #[tokio::test]
        async fn forbidden_maps_to_403_without_debug() {
            let err = AuthnError::from(
                ForbiddenError::new("subject_from returned a non-string")
                    .with_debug("Body: {\"token\":\"abc\"}"),
            );
            let (status, body) = body_of(err).await;

            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body["error"], "subject_from returned a non-string");
            assert_eq!(body["status"], 403);
            assert!(!body.to_string().contains("abc"));
        }

        #[tokio::test]
        async fn not_responsible_maps_to_401() {
            let (status, _) = body_of(AuthnError::NotResponsible).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn rejected_token_maps_to_401_and_transport_to_502() {
            let rejected = AuthnError::from(ForwardError::Rejected {
                status: http::StatusCode::UNAUTHORIZED,
            });
            let (status, _) = body_of(rejected).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            let timeout =
                AuthnError::from(ForwardError::Timeout(std::time::Duration::from_secs(1)));
            let (status, body) = body_of(timeout).await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(body["error"], "introspection endpoint unavailable");
        }

        #[tokio::test]
        async fn configuration_errors_map_to_500() {
            let (status, body) = body_of(AuthnError::not_enabled("simple_bearer")).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "internal server error");
        }
    }
}
