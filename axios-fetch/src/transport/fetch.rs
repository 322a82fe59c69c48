//! The fetch primitive the dispatcher sends requests through.
//!
//! A [`Transport`] takes a fully resolved [`FetchRequest`] and yields the raw
//! reply. Status validation, body decoding and timeouts stay in the
//! dispatcher, so a transport only moves bytes.

use std::future::Future;
use std::sync::Arc;

use axios_fetch_core::Body;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::config::{BoxFuture, Credentials};
use crate::error::Error;

/// A request ready to be sent.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// `None` for body-less methods or when no payload was given.
    pub body: Option<Body>,
    pub credentials: Credentials,
}

/// The raw reply to a [`FetchRequest`].
#[derive(Clone, Debug, Default)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    /// Final address after any redirects.
    pub url: String,
    pub body: Bytes,
}

impl FetchResponse {
    /// A reply with `status` and its canonical reason phrase.
    pub fn new(status: u16) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            ..Self::default()
        }
    }

    pub fn status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Sends resolved requests.
///
/// Any error other than [`Error::Client`] is reported to the caller as a
/// network error.
pub trait Transport: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, Error>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, Error>> {
        (**self).fetch(request)
    }
}

/// A [`Transport`] backed by an async closure.
///
/// # Example
///
/// ```
/// use axios_fetch::{Client, FetchRequest, FetchResponse, FnTransport};
///
/// let transport = FnTransport::new(|request: FetchRequest| async move {
///     Ok(FetchResponse::new(200).url(request.url).body(r#"{"ok":true}"#))
/// });
/// let client = Client::with_transport(transport);
/// ```
#[derive(Clone)]
pub struct FnTransport<F> {
    func: F,
}

impl<F, Fut> FnTransport<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, Error>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(FetchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, Error>> + Send + 'static,
{
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, Error>> {
        Box::pin((self.func)(request))
    }
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}
