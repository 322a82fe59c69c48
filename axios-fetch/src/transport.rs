//! Transport layer.
//!
//! - [`Transport`]: the fetch primitive the dispatcher calls
//! - [`FnTransport`]: a closure-backed transport, handy for tests and mocks
//! - [`HyperTransport`]: HTTP/1.1 and HTTP/2 over hyper_util's legacy client,
//!   following redirects like a fetch primitive
//!
//! # Feature Flags
//!
//! - `tls` (default) - Enables `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates
//!
//! # Example
//!
//! ```ignore
//! use axios_fetch::transport::HyperTransport;
//! use std::time::Duration;
//!
//! let transport = HyperTransport::builder()
//!     .pool_idle_timeout(Some(Duration::from_secs(30)))
//!     .build()?;
//! ```

mod connector;
mod fetch;
mod hyper;
mod redirect;

pub use connector::{
    DangerousAcceptAnyCertVerifier, build_https_connector, danger_accept_invalid_certs_config,
    has_tls_support,
};
#[cfg(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))]
pub use connector::default_tls_config;
pub use fetch::{FetchRequest, FetchResponse, FnTransport, Transport};
pub use hyper::{HyperTransport, HyperTransportBuilder};
pub use redirect::{FetchRedirectPolicy, MAX_REDIRECTS};

pub use rustls::ClientConfig as TlsClientConfig;
