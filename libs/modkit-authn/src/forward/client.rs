use super::{ForwardError, ForwarderConfig, SessionStoreForwarder, tls};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, StatusCode, header, request::Parts};
use http_body_util::{BodyExt, Empty, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Instant;
use url::Url;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Empty<Bytes>>;

/// Headers describing the inbound connection or body are not forwarded
fn is_skipped_header(name: &HeaderName) -> bool {
    *name == header::HOST
        || *name == header::CONTENT_LENGTH
        || *name == header::TRANSFER_ENCODING
        || *name == header::CONNECTION
}

/// Forwarder over a pooled hyper client with rustls.
///
/// `HttpForwarder` is cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpForwarder {
    client: HttpsClient,
    config: ForwarderConfig,
}

impl HttpForwarder {
    /// Build a forwarder.
    ///
    /// # Errors
    /// Returns `ForwardError::Tls` if no usable root certificates are available
    /// and plain HTTP is not allowed.
    pub fn new(config: ForwarderConfig) -> Result<Self, ForwardError> {
        if config.allow_insecure_http {
            tracing::warn!("insecure HTTP enabled for introspection; use only for testing");
        }

        let tls = tls::native_roots_client_config(config.allow_insecure_http)
            .map_err(ForwardError::Tls)?;

        let builder = hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(tls);
        let builder = if config.allow_insecure_http {
            builder.https_or_http()
        } else {
            builder.https_only()
        };
        let connector = builder.enable_http1().enable_http2().build();

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .build(connector);

        Ok(Self { client, config })
    }

    async fn exchange(&self, outbound: http::Request<Empty<Bytes>>) -> Result<Bytes, ForwardError> {
        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|e| ForwardError::Transport(Box::new(e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ForwardError::Rejected { status });
        }

        let limit = self.config.max_body_size;
        let collected = Limited::new(response.into_body(), limit)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    ForwardError::BodyTooLarge { limit }
                } else {
                    ForwardError::Transport(e)
                }
            })?;

        Ok(collected.to_bytes())
    }
}

/// Plain HTTP only with `allow_insecure_http`; other schemes never.
fn check_scheme(config: &ForwarderConfig, target: &Url) -> Result<(), ForwardError> {
    match target.scheme() {
        "https" => Ok(()),
        "http" if config.allow_insecure_http => Ok(()),
        "http" => Err(ForwardError::InvalidScheme {
            scheme: "http".to_owned(),
            reason: "plain HTTP is disabled; set allow_insecure_http".to_owned(),
        }),
        other => Err(ForwardError::InvalidScheme {
            scheme: other.to_owned(),
            reason: "only http and https are supported".to_owned(),
        }),
    }
}

/// Target of the outbound call: `url` itself, or `url` with its path replaced
/// by the inbound request path.
fn target_url(url: &Url, original: &http::Uri, preserve_path: bool) -> Url {
    let mut target = url.clone();
    if preserve_path {
        target.set_path(original.path());
    }
    target
}

#[async_trait]
impl SessionStoreForwarder for HttpForwarder {
    async fn forward(
        &self,
        request: &Parts,
        url: &Url,
        preserve_path: bool,
    ) -> Result<Bytes, ForwardError> {
        let target = target_url(url, &request.uri, preserve_path);
        check_scheme(&self.config, &target)?;

        let uri: http::Uri = target
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| ForwardError::InvalidUrl {
                url: target.to_string(),
                reason: e.to_string(),
            })?;

        let mut builder = http::Request::builder()
            .method(request.method.clone())
            .uri(uri);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in &request.headers {
                if !is_skipped_header(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
        let outbound = builder.body(Empty::<Bytes>::new())?;

        let started = Instant::now();
        let timeout = self.config.timeout;
        let result = tokio::time::timeout(timeout, self.exchange(outbound))
            .await
            .map_err(|_| ForwardError::Timeout(timeout))?;

        tracing::debug!(
            method = %request.method,
            host = target.host_str().unwrap_or_default(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            ok = result.is_ok(),
            "introspection request finished"
        );

        result
    }
}
