//! Configuration modules for the client.
//!
//! - [`RequestConfig`]: per-request options
//! - [`Defaults`] and [`InstanceConfig`]: instance defaults and overrides
//! - [`InterceptorManager`]: request/response interception

mod defaults;
mod interceptor;
mod request;

pub use defaults::{
    COMMON_TIER, DEFAULT_TIMEOUT, Defaults, HeaderTable, InstanceConfig, ResolvedRequest,
    default_validate_status, normalize_method, resolve_headers_for,
};
pub use interceptor::{
    BoxFuture, Interceptor, InterceptorId, InterceptorManager, Interceptors, OnFulfilled,
    OnRejected,
};
pub use request::{Credentials, RequestConfig, ResponseType, ValidateStatus};
