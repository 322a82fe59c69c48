//! Instance defaults and request resolution.
//!
//! This module provides:
//! - [`HeaderTable`]: the `common` header tier plus one tier per method
//! - [`InstanceConfig`]: partial overrides used to build or derive an instance
//! - [`Defaults`]: the resolved defaults of one instance
//! - [`ResolvedRequest`]: a request with every field settled
//!
//! Precedence for every field is request > instance > base defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axios_fetch_core::{
    Body, HeaderError, JSON_CONTENT_TYPE, ParamsSerializer, build_url, combine_url, encode_body,
    normalize_headers, overlay_headers, parse_header,
};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use serde::{Deserialize, Deserializer, de};

use crate::config::{Credentials, RequestConfig, ResponseType, ValidateStatus};
use crate::error::Error;

/// Timeout applied when nothing else sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

/// Name of the tier applied to every method.
pub const COMMON_TIER: &str = "common";

/// Accepts `200..=299`.
pub fn default_validate_status() -> ValidateStatus {
    Arc::new(|status| (200..300).contains(&status))
}

/// Uppercase a method name.
pub fn normalize_method(method: &Method) -> Method {
    Method::from_bytes(method.as_str().to_ascii_uppercase().as_bytes())
        .unwrap_or_else(|_| method.clone())
}

// ============================================================================
// HeaderTable
// ============================================================================

/// Default headers, split into tiers.
///
/// The `common` tier applies to every request; a method tier (keyed by the
/// lowercase method name) applies only to that method and wins over `common`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderTable {
    pub common: HeaderMap,
    methods: BTreeMap<String, HeaderMap>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tier for `name` (`"common"` or a method name in any case).
    pub fn tier(&self, name: &str) -> Option<&HeaderMap> {
        let name = name.to_ascii_lowercase();
        if name == COMMON_TIER {
            return Some(&self.common);
        }
        self.methods.get(&name)
    }

    /// The tier for `name`, created empty when missing.
    pub fn tier_mut(&mut self, name: &str) -> &mut HeaderMap {
        let name = name.to_ascii_lowercase();
        if name == COMMON_TIER {
            return &mut self.common;
        }
        self.methods.entry(name).or_default()
    }

    /// The tier for a method.
    pub fn for_method(&self, method: &Method) -> Option<&HeaderMap> {
        self.tier(method.as_str())
    }

    /// Names of the method tiers, lowercase and sorted.
    pub fn method_tiers(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Set one header in a tier.
    pub fn with_header(mut self, tier: &str, name: &str, value: &str) -> Result<Self, HeaderError> {
        let (name, value) = parse_header(name, value)?;
        self.tier_mut(tier).insert(name, value);
        Ok(self)
    }

    /// Lay `other` over this table, tier by tier.
    pub fn merge(&self, other: &HeaderTable) -> HeaderTable {
        let mut merged = self.clone();
        overlay_headers(&mut merged.common, &other.common);
        for (tier, headers) in &other.methods {
            overlay_headers(merged.methods.entry(tier.clone()).or_default(), headers);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.common.is_empty() && self.methods.values().all(HeaderMap::is_empty)
    }

    fn base() -> Self {
        let mut table = HeaderTable::new();
        for tier in ["get", "delete", "head", "options"] {
            table.tier_mut(tier);
        }
        for tier in ["post", "put", "patch"] {
            table
                .tier_mut(tier)
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        table
    }
}

type PlainTable = BTreeMap<String, BTreeMap<String, Option<String>>>;

impl TryFrom<PlainTable> for HeaderTable {
    type Error = HeaderError;

    fn try_from(plain: PlainTable) -> Result<Self, Self::Error> {
        let mut table = HeaderTable::new();
        for (tier, headers) in plain {
            let headers = normalize_headers(headers)?;
            overlay_headers(table.tier_mut(&tier), &headers);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for HeaderTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let plain = PlainTable::deserialize(deserializer)?;
        HeaderTable::try_from(plain).map_err(de::Error::custom)
    }
}

/// Headers for one request: `common`, then the method tier, then the
/// request's own headers, each replacing the previous per name.
pub fn resolve_headers_for(method: &Method, table: &HeaderTable, request: &HeaderMap) -> HeaderMap {
    let mut headers = table.common.clone();
    if let Some(tier) = table.for_method(&normalize_method(method)) {
        overlay_headers(&mut headers, tier);
    }
    overlay_headers(&mut headers, request);
    headers
}

// ============================================================================
// InstanceConfig
// ============================================================================

/// Partial defaults for building or deriving an instance.
///
/// Deserializes from the usual camelCase option names, with `timeout` in
/// milliseconds. Closures can only be set from code.
///
/// # Example
///
/// ```
/// use axios_fetch::InstanceConfig;
///
/// let config = InstanceConfig::from_json(r#"{
///     "baseURL": "https://api.example.com",
///     "timeout": 2500,
///     "headers": { "common": { "X-Client": "cli" } }
/// }"#).unwrap();
/// assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    #[serde(default, deserialize_with = "deserialize_method")]
    pub method: Option<Method>,
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timeout_ms")]
    pub timeout: Option<Duration>,
    pub response_type: Option<ResponseType>,
    #[serde(skip)]
    pub validate_status: Option<ValidateStatus>,
    pub with_credentials: Option<bool>,
    #[serde(skip)]
    pub params_serializer: Option<ParamsSerializer>,
    #[serde(default)]
    pub headers: HeaderTable,
}

impl InstanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// `Duration::ZERO` disables the timeout.
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

    pub fn params_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&axios_fetch_core::Params) -> String + Send + Sync + 'static,
    {
        self.params_serializer = Some(Arc::new(serializer));
        self
    }

    pub fn headers(mut self, headers: HeaderTable) -> Self {
        self.headers = headers;
        self
    }

    /// Set one header in a tier.
    pub fn header(mut self, tier: &str, name: &str, value: &str) -> Result<Self, HeaderError> {
        self.headers = self.headers.with_header(tier, name, value)?;
        Ok(self)
    }
}

impl fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("response_type", &self.response_type)
            .field("validate_status", &self.validate_status.is_some())
            .field("with_credentials", &self.with_credentials)
            .field("params_serializer", &self.params_serializer.is_some())
            .field("headers", &self.headers)
            .finish()
    }
}

fn deserialize_method<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Method>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|name| Method::from_bytes(name.to_ascii_uppercase().as_bytes()).map_err(de::Error::custom))
        .transpose()
}

fn deserialize_timeout_ms<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

// ============================================================================
// Defaults
// ============================================================================

/// The defaults of one instance.
///
/// Mutations are visible to every later request of that instance; requests
/// already dispatched keep the snapshot they started with.
#[derive(Clone)]
pub struct Defaults {
    pub method: Method,
    pub base_url: String,
    /// `Duration::ZERO` means no timeout.
    pub timeout: Duration,
    pub response_type: ResponseType,
    pub validate_status: ValidateStatus,
    pub with_credentials: bool,
    pub params_serializer: Option<ParamsSerializer>,
    pub headers: HeaderTable,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            method: Method::GET,
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            response_type: ResponseType::Json,
            validate_status: default_validate_status(),
            with_credentials: false,
            params_serializer: None,
            headers: HeaderTable::base(),
        }
    }
}

impl Defaults {
    /// Base defaults overlaid with `config`.
    pub fn from_config(config: &InstanceConfig) -> Self {
        Self::default().merge(config)
    }

    /// A copy of these defaults with `overrides` applied.
    ///
    /// Scalars are replaced when set; header tiers are merged tier by tier.
    pub fn merge(&self, overrides: &InstanceConfig) -> Defaults {
        Defaults {
            method: overrides.method.clone().unwrap_or_else(|| self.method.clone()),
            base_url: overrides.base_url.clone().unwrap_or_else(|| self.base_url.clone()),
            timeout: overrides.timeout.unwrap_or(self.timeout),
            response_type: overrides.response_type.unwrap_or(self.response_type),
            validate_status: overrides
                .validate_status
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.validate_status)),
            with_credentials: overrides.with_credentials.unwrap_or(self.with_credentials),
            params_serializer: overrides
                .params_serializer
                .clone()
                .or_else(|| self.params_serializer.clone()),
            headers: self.headers.merge(&overrides.headers),
        }
    }

    /// Settle every field of `config` against these defaults.
    ///
    /// Fails with [`Error::MissingUrl`] when the request has no address.
    pub fn resolve(&self, config: &RequestConfig) -> Result<ResolvedRequest, Error> {
        let url = config
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(Error::MissingUrl)?;

        let method = normalize_method(config.method.as_ref().unwrap_or(&self.method));
        let base_url = config.base_url.as_deref().unwrap_or(&self.base_url);
        let serializer = config
            .params_serializer
            .as_ref()
            .or(self.params_serializer.as_ref());
        let url = build_url(&combine_url(base_url, url), config.params.as_ref(), serializer);

        let mut headers = resolve_headers_for(&method, &self.headers, &config.headers);
        for name in &config.unset_headers {
            headers.remove(name);
        }
        let body = encode_body(&method, config.data.clone(), &mut headers);

        Ok(ResolvedRequest {
            method,
            url,
            headers,
            body,
            timeout: config.timeout.unwrap_or(self.timeout),
            response_type: config.response_type.unwrap_or(self.response_type),
            credentials: Credentials::from_with_credentials(
                config.with_credentials.unwrap_or(self.with_credentials),
            ),
            validate_status: config
                .validate_status
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.validate_status)),
        })
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("response_type", &self.response_type)
            .field("with_credentials", &self.with_credentials)
            .field("params_serializer", &self.params_serializer.is_some())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A request with every field settled, ready for dispatch.
#[derive(Clone)]
pub struct ResolvedRequest {
    pub method: Method,
    /// Base address, path and query combined.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    pub timeout: Duration,
    pub response_type: ResponseType,
    pub credentials: Credentials,
    pub validate_status: ValidateStatus,
}

impl fmt::Debug for ResolvedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("response_type", &self.response_type)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
