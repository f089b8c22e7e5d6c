use std::time::Duration;
use thiserror::Error;

/// Introspection forwarding errors
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid introspection URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },

    #[error("failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("response body too large: limit {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The endpoint answered with a status other than 200 OK
    #[error("introspection endpoint rejected the request: HTTP {status}")]
    Rejected { status: http::StatusCode },
}
