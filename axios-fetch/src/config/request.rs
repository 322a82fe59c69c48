//! Per-request configuration.
//!
//! [`RequestConfig`] carries everything a single call may override. Every
//! field is optional and falls back to the instance defaults at dispatch.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axios_fetch_core::{
    HeaderError, HeaderInput, ParamValue, Params, ParamsSerializer, RequestData, normalize_headers,
    overlay_headers,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};

/// Decides whether a status code counts as success.
pub type ValidateStatus = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// How the response body is decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Parse as JSON, falling back to text.
    #[default]
    Json,
    Text,
    Blob,
    #[serde(rename = "arraybuffer")]
    ArrayBuffer,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Json => "json",
            ResponseType::Text => "text",
            ResponseType::Blob => "blob",
            ResponseType::ArrayBuffer => "arraybuffer",
        }
    }
}

/// Credential mode handed to the transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Credentials {
    #[default]
    SameOrigin,
    Include,
}

impl Credentials {
    pub fn from_with_credentials(with_credentials: bool) -> Self {
        if with_credentials {
            Credentials::Include
        } else {
            Credentials::SameOrigin
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::SameOrigin => "same-origin",
            Credentials::Include => "include",
        }
    }
}

/// Options for one request.
///
/// Fields left unset inherit from the instance [`Defaults`](crate::Defaults).
/// Request interceptors receive and return this value, so every field is
/// public.
///
/// # Example
///
/// ```
/// use axios_fetch::RequestConfig;
/// use http::Method;
/// use std::time::Duration;
///
/// let config = RequestConfig::new()
///     .url("/users")
///     .method(Method::POST)
///     .header("authorization", "Bearer token123")
///     .param("page", 2)
///     .timeout(Duration::from_secs(5));
/// assert_eq!(config.url.as_deref(), Some("/users"));
/// ```
#[derive(Clone, Default)]
pub struct RequestConfig {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub base_url: Option<String>,
    /// Request-level headers, laid over the default tiers.
    pub headers: HeaderMap,
    /// Names removed from the resolved headers, including defaults.
    pub unset_headers: Vec<HeaderName>,
    pub params: Option<Params>,
    pub params_serializer: Option<ParamsSerializer>,
    pub data: Option<RequestData>,
    /// `Duration::ZERO` disables the timeout.
    pub timeout: Option<Duration>,
    pub response_type: Option<ResponseType>,
    pub validate_status: Option<ValidateStatus>,
    pub with_credentials: Option<bool>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Override the instance base address for this call.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a request header.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    /// Try to add a request header.
    ///
    /// Returns `None` if the header name or value is invalid.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Option<Self>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = name.try_into().ok()?;
        let value = value.try_into().ok()?;
        self.headers.insert(name, value);
        Some(self)
    }

    /// Lay caller-supplied headers over the ones already set.
    ///
    /// Plain entries with an absent value are skipped.
    pub fn headers(mut self, headers: impl Into<HeaderInput>) -> Result<Self, HeaderError> {
        let headers = normalize_headers(headers)?;
        overlay_headers(&mut self.headers, &headers);
        Ok(self)
    }

    /// Remove a header from the resolved set, even one coming from defaults.
    ///
    /// A content type removed this way is still defaulted by the body encoder.
    pub fn unset_header(mut self, name: HeaderName) -> Self {
        self.headers.remove(&name);
        self.unset_headers.push(name);
        self
    }

    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Append one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.get_or_insert_with(Params::new).push(key, value);
        self
    }

    pub fn params_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        self.params_serializer = Some(Arc::new(serializer));
        self
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a JSON payload from any serializable value.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(RequestData::json(value)?);
        Ok(self)
    }

    /// Set the timeout for this call. `Duration::ZERO` means none.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn validate_status<F>(mut self, validate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(Arc::new(validate));
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("unset_headers", &self.unset_headers)
            .field("params", &self.params)
            .field("params_serializer", &self.params_serializer.is_some())
            .field("data", &self.data)
            .field("timeout", &self.timeout)
            .field("response_type", &self.response_type)
            .field("validate_status", &self.validate_status.is_some())
            .field("with_credentials", &self.with_credentials)
            .finish()
    }
}
