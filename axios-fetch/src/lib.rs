//! An axios-compatible HTTP client over a fetch-style transport.
//!
//! ## Features
//!
//! - Instance defaults with per-method header tiers
//! - Request and response interceptors with promise-style recovery
//! - Payload classification (text, multipart, URL-encoded, binary, JSON)
//! - Query serialization with dates, lists and nested objects
//! - Per-request timeout with cancellation of the in-flight request
//! - Status validation with machine-readable error codes
//! - Derived instances via [`Client::create`]
//!
//! ## Example
//!
//! ```ignore
//! use axios_fetch::{Client, ErrorCode, RequestConfig};
//! use std::time::Duration;
//!
//! let client = Client::builder()
//!     .base_url("https://api.example.com")
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! client.interceptors().request.use_fulfilled(|config: RequestConfig| async move {
//!     Ok(config.header("authorization", "Bearer token123"))
//! });
//!
//! match client.get("/users/1").await {
//!     Ok(response) => println!("{:?}", response.data),
//!     Err(err) if err.code() == Some(ErrorCode::BadRequest) => {
//!         println!("client error: {}", err.response().unwrap().status);
//!     }
//!     Err(err) => return Err(err.into()),
//! }
//! ```
//!
//! ## Testing without a network
//!
//! ```
//! use axios_fetch::{Client, FetchRequest, FetchResponse, FnTransport};
//!
//! let client = Client::with_transport(FnTransport::new(|request: FetchRequest| async move {
//!     Ok(FetchResponse::new(200).url(request.url).body(r#"{"id":1}"#))
//! }));
//! assert!(client.interceptors().request.is_empty());
//! ```

mod builder;
mod client;
pub mod config;
mod dispatch;
mod error;
mod response;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder};
pub use client::Client;
pub use config::{
    BoxFuture, Credentials, DEFAULT_TIMEOUT, Defaults, HeaderTable, InstanceConfig, Interceptor,
    InterceptorId, InterceptorManager, Interceptors, RequestConfig, ResolvedRequest, ResponseType,
    ValidateStatus, resolve_headers_for,
};
pub use dispatch::decode_body;
pub use error::{ClientError, Error, is_axios_error};
pub use response::{RequestInfo, Response, ResponseData};
pub use transport::{FetchRequest, FetchResponse, FnTransport, HyperTransport, Transport};

// Re-export the building blocks callers pass in.
pub use axios_fetch_core::{
    Blob, Body, ErrorCode, FormData, FormValue, HeaderError, HeaderInput, ParamValue, Params,
    ParamsSerializer, RequestData, UnknownErrorCode, UrlSearchParams, build_url, combine_url, encode_body,
    is_absolute_url, normalize_headers, serialize_params, set_if_absent,
};
