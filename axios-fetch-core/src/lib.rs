//! Core building blocks for axios-fetch.
//!
//! This crate provides the transport-free pieces used by the client
//! (`axios-fetch`): everything here is pure and synchronous.
//!
//! ## Modules
//!
//! - [`code`]: Machine-readable error codes
//! - [`uri`]: Base/path combination and query-string serialization
//! - [`headers`]: Case-insensitive header normalization and tier overlay
//! - [`body`]: Request payload kinds and the body encoder

mod body;
mod code;
mod headers;
mod uri;

pub use body::*;
pub use code::*;
pub use headers::*;
pub use uri::*;
