//! Forwarding of inbound requests to a session store / introspection endpoint.

mod client;
mod config;
mod error;
mod tls;

pub use config::ForwarderConfig;
pub use error::ForwardError;
pub use client::HttpForwarder;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// Performs the outbound call on behalf of an authenticator.
///
/// Implementations reuse the original request's method and headers (so the
/// bearer token travels in the same place the client put it) and target `url`.
/// With `preserve_path`, the original request path replaces the path of `url`.
#[async_trait]
pub trait SessionStoreForwarder: Send + Sync {
    /// Execute the call and return the raw response body.
    ///
    /// # Errors
    /// Transport failures, timeouts and status-based rejections.
    async fn forward(
        &self,
        request: &http::request::Parts,
        url: &Url,
        preserve_path: bool,
    ) -> Result<Bytes, ForwardError>;
}
