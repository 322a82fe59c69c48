//! Hyper-based HTTP transport.
//!
//! [`HyperTransport`] plays the role of a fetch primitive: it applies the
//! content type a fetch implementation would infer from the body kind, sends
//! the request with hyper_util's legacy client, follows redirects, and
//! buffers the reply.

use std::time::Duration;

use axios_fetch_core::{Body, set_if_absent};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;
use tower::ServiceExt;
use tower_http::follow_redirect::{FollowRedirect, RequestUri};

use super::connector::{build_https_connector, danger_accept_invalid_certs_config};
use super::fetch::{FetchRequest, FetchResponse, Transport};
use super::redirect::{FetchRedirectPolicy, MAX_REDIRECTS};
use crate::builder::ClientBuildError;
use crate::config::BoxFuture;
use crate::error::Error;

type HyperClient =
    FollowRedirect<Client<HttpsConnector<HttpConnector>, Full<Bytes>>, FetchRedirectPolicy>;

/// HTTP transport over hyper.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    http2_only: bool,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("http2_only", &self.http2_only)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a transport with default settings.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::builder().build()
    }

    pub fn is_http2_only(&self) -> bool {
        self.http2_only
    }
}

impl Transport for HyperTransport {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, Error>> {
        let client = self.client.clone();
        Box::pin(send(client, request))
    }
}

async fn send(client: HyperClient, request: FetchRequest) -> Result<FetchResponse, Error> {
    let FetchRequest {
        method,
        url,
        mut headers,
        body,
        ..
    } = request;

    let body = match body {
        Some(body) => prepare_body(body, &mut headers),
        None => Full::default(),
    };

    let uri: http::Uri = url
        .parse()
        .map_err(|e| Error::Transport(format!("invalid url {}: {}", url, e)))?;

    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(request_headers) = builder.headers_mut() {
        *request_headers = headers;
    }
    let request = builder
        .body(body)
        .map_err(|e| Error::Transport(format!("failed to build request: {}", e)))?;

    let response = client
        .oneshot(request)
        .await
        .map_err(|e| Error::Transport(format!("request failed: {}", e)))?;

    let status = response.status();
    let status_text = response
        .extensions()
        .get::<::hyper::ext::ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| status.canonical_reason())
        .unwrap_or_default()
        .to_string();
    let headers = response.headers().clone();
    // The final address after redirects; the request URL when none were followed.
    let url = response
        .extensions()
        .get::<RequestUri>()
        .map_or(url, |uri| uri.0.to_string());
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::Transport(format!("failed to read body: {}", e)))?
        .to_bytes();

    Ok(FetchResponse {
        status: status.as_u16(),
        status_text,
        headers,
        url,
        body,
    })
}

/// Serialize the body, applying its implicit content type when none is set.
fn prepare_body(body: Body, headers: &mut HeaderMap) -> Full<Bytes> {
    let payload = body.into_payload(&multipart_boundary());
    if let Some(content_type) = payload.implicit_content_type {
        if let Ok(value) = HeaderValue::from_str(&content_type) {
            set_if_absent(headers, CONTENT_TYPE, value);
        }
    }
    Full::new(payload.bytes)
}

fn multipart_boundary() -> String {
    format!("----axiosfetch{:032x}", rand::random::<u128>())
}

/// Builder for [`HyperTransport`].
pub struct HyperTransportBuilder {
    tls_config: Option<ClientConfig>,
    http2_only: bool,
    pool_idle_timeout: Option<Duration>,
    max_redirects: usize,
    danger_accept_invalid_certs: bool,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    pub fn new() -> Self {
        Self {
            tls_config: None,
            http2_only: false,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            max_redirects: MAX_REDIRECTS,
            danger_accept_invalid_certs: false,
        }
    }

    /// Use a custom TLS configuration.
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    pub fn http2_only(mut self, enabled: bool) -> Self {
        self.http2_only = enabled;
        self
    }

    /// How long idle connections stay pooled. `None` keeps them forever.
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Maximum redirects followed per request. `0` returns every 3xx as is.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Skip certificate verification. Development only.
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.danger_accept_invalid_certs = true;
        self
    }

    pub fn build(self) -> Result<HyperTransport, ClientBuildError> {
        let tls_config = if self.danger_accept_invalid_certs {
            Some(danger_accept_invalid_certs_config()?)
        } else {
            self.tls_config
        };
        let connector = build_https_connector(tls_config)?;

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new());
        builder.pool_idle_timeout(self.pool_idle_timeout);
        if self.http2_only {
            builder.http2_only(true);
        }

        Ok(HyperTransport {
            client: FollowRedirect::with_policy(
                builder.build(connector),
                FetchRedirectPolicy::new(self.max_redirects),
            ),
            http2_only: self.http2_only,
        })
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("tls_config", &self.tls_config.is_some())
            .field("http2_only", &self.http2_only)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("max_redirects", &self.max_redirects)
            .field("danger_accept_invalid_certs", &self.danger_accept_invalid_certs)
            .finish()
    }
}
