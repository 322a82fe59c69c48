//! The client instance.
//!
//! A [`Client`] owns its defaults, its interceptor registries and a shared
//! transport. Clones are handles to the same instance; [`Client::create`]
//! derives an independent one.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use axios_fetch_core::RequestData;
use http::Method;

use crate::builder::{ClientBuildError, ClientBuilder};
use crate::config::{BoxFuture, Defaults, InstanceConfig, Interceptor, Interceptors, RequestConfig};
use crate::dispatch::dispatch_request;
use crate::error::{Error, is_axios_error};
use crate::response::Response;
use crate::transport::Transport;

struct Inner {
    defaults: RwLock<Defaults>,
    interceptors: Interceptors,
    transport: Arc<dyn Transport>,
}

/// An HTTP client instance.
///
/// # Example
///
/// ```ignore
/// use axios_fetch::{Client, RequestConfig};
///
/// let client = Client::builder().base_url("https://api.example.com").build()?;
///
/// let users = client.get("/users").await?;
/// let created = client.post("/users", serde_json::json!({"name": "ada"})).await?;
/// let filtered = client
///     .get_with_config("/users", RequestConfig::new().param("active", true))
///     .await?;
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults())
            .field("request_interceptors", &self.inner.interceptors.request.len())
            .field("response_interceptors", &self.inner.interceptors.response.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with base defaults over [`HyperTransport`](crate::transport::HyperTransport).
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::builder().build()
    }

    /// Create a client with base defaults over a custom transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self::from_parts(Arc::new(transport), Defaults::default())
    }

    pub(crate) fn from_parts(transport: Arc<dyn Transport>, defaults: Defaults) -> Self {
        Self {
            inner: Arc::new(Inner {
                defaults: RwLock::new(defaults),
                interceptors: Interceptors::new(),
                transport,
            }),
        }
    }

    /// Derive a new instance.
    ///
    /// The child starts from a deep copy of this instance's defaults with
    /// `overrides` merged in, shares the transport, and gets empty
    /// interceptor registries. Neither instance sees later changes to the
    /// other.
    pub fn create(&self, overrides: InstanceConfig) -> Client {
        let defaults = self.defaults().merge(&overrides);
        Self::from_parts(Arc::clone(&self.inner.transport), defaults)
    }

    /// A snapshot of the current defaults.
    pub fn defaults(&self) -> Defaults {
        self.inner
            .defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutable access to the defaults.
    ///
    /// Changes apply to every request dispatched afterwards. Do not hold the
    /// guard across an `.await`.
    pub fn defaults_mut(&self) -> RwLockWriteGuard<'_, Defaults> {
        self.inner
            .defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The request and response interceptor registries.
    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// Check whether an error carries the client discriminator.
    pub fn is_axios_error(err: &(dyn std::error::Error + 'static)) -> bool {
        is_axios_error(err)
    }

    /// Run one request through the interceptor chain and the dispatcher.
    ///
    /// Both interceptor registries are snapshotted here, when the request is
    /// submitted; registering or ejecting afterwards does not affect it.
    /// Request interceptors run newest first, response interceptors oldest
    /// first. An error from any stage skips the remaining fulfilled handlers
    /// until a rejected handler recovers it.
    pub fn call(&self, config: RequestConfig) -> BoxFuture<'static, Result<Response, Error>> {
        let request_stage = self.inner.interceptors.request.snapshot();
        let response_stage = self.inner.interceptors.response.snapshot();
        let client = self.clone();
        Box::pin(async move { client.run_chain(config, request_stage, response_stage).await })
    }

    async fn run_chain(
        &self,
        config: RequestConfig,
        request_stage: Vec<Interceptor<RequestConfig>>,
        response_stage: Vec<Interceptor<Response>>,
    ) -> Result<Response, Error> {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            request_interceptors = request_stage.len(),
            response_interceptors = response_stage.len(),
            "running interceptor chain"
        );

        let mut config = Ok(config);
        for interceptor in request_stage.iter().rev() {
            config = interceptor.apply(config).await;
        }

        let mut response = match config {
            Ok(config) => {
                let defaults = self.defaults();
                dispatch_request(self.inner.transport.as_ref(), &defaults, config).await
            }
            Err(err) => Err(err),
        };

        for interceptor in &response_stage {
            response = interceptor.apply(response).await;
        }
        response
    }

    /// [`call`](Self::call) with the address given separately.
    ///
    /// `url` replaces any address in `config`.
    pub fn call_url(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url))
    }

    /// Alias of [`call`](Self::call).
    pub fn request(&self, config: RequestConfig) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config)
    }

    pub fn get(&self, url: impl Into<String>) -> BoxFuture<'static, Result<Response, Error>> {
        self.get_with_config(url, RequestConfig::new())
    }

    pub fn get_with_config(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).method(Method::GET))
    }

    pub fn delete(&self, url: impl Into<String>) -> BoxFuture<'static, Result<Response, Error>> {
        self.delete_with_config(url, RequestConfig::new())
    }

    pub fn delete_with_config(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).method(Method::DELETE))
    }

    pub fn head(&self, url: impl Into<String>) -> BoxFuture<'static, Result<Response, Error>> {
        self.head_with_config(url, RequestConfig::new())
    }

    pub fn head_with_config(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).method(Method::HEAD))
    }

    pub fn options(&self, url: impl Into<String>) -> BoxFuture<'static, Result<Response, Error>> {
        self.options_with_config(url, RequestConfig::new())
    }

    pub fn options_with_config(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).method(Method::OPTIONS))
    }

    pub fn post(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.post_with_config(url, data, RequestConfig::new())
    }

    pub fn post_with_config(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).data(data).method(Method::POST))
    }

    pub fn put(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.put_with_config(url, data, RequestConfig::new())
    }

    pub fn put_with_config(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).data(data).method(Method::PUT))
    }

    pub fn patch(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.patch_with_config(url, data, RequestConfig::new())
    }

    pub fn patch_with_config(
        &self,
        url: impl Into<String>,
        data: impl Into<RequestData>,
        config: RequestConfig,
    ) -> BoxFuture<'static, Result<Response, Error>> {
        self.call(config.url(url).data(data).method(Method::PATCH))
    }
}
