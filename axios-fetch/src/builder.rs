//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`Client`].

use std::sync::Arc;
use std::time::Duration;

use axios_fetch_core::Params;
use http::Method;

use crate::client::Client;
use crate::config::{Defaults, HeaderTable, InstanceConfig, ResponseType};
use crate::transport::{HyperTransport, Transport};

/// Errors that can occur while building a client or transport.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("TLS configuration error: {0}")]
    Tls(String),
}

/// Builder for creating a [`Client`].
///
/// Without an explicit transport, [`HyperTransport`] with default settings
/// is used.
///
/// # Example
///
/// ```ignore
/// use axios_fetch::Client;
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: InstanceConfig,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("transport", &self.transport.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send requests through a custom transport.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Replace every override collected so far.
    pub fn config(mut self, config: InstanceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.base_url(base_url);
        self
    }

    /// Default timeout. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.config = self.config.method(method);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.config = self.config.response_type(response_type);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.config = self.config.with_credentials(with_credentials);
        self
    }

    pub fn validate_status<F>(mut self, validate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.config = self.config.validate_status(validate);
        self
    }

    pub fn params_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        self.config = self.config.params_serializer(serializer);
        self
    }

    /// Default header tiers, merged over the base tiers.
    pub fn headers(mut self, headers: HeaderTable) -> Self {
        self.config = self.config.headers(headers);
        self
    }

    pub fn build(self) -> Result<Client, ClientBuildError> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new()?),
        };
        Ok(Client::from_parts(transport, Defaults::from_config(&self.config)))
    }
}
