//! Error codes reported by the client.
//!
//! The string forms are part of the public contract: callers written against
//! the emulated client compare `error.code` against these exact literals.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A string that is not one of the [`ErrorCode`] literals.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

/// Machine-readable code attached to every client error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The configured timeout elapsed before a reply arrived.
    ConnAborted,
    /// Transport-level failure with no interpretable reply.
    Network,
    /// A reply was received but the validator rejected its 4xx status.
    BadRequest,
    /// A reply was received but the validator rejected a non-4xx status.
    BadResponse,
}

impl ErrorCode {
    /// Get the string representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnAborted => "ECONNABORTED",
            ErrorCode::Network => "ERR_NETWORK",
            ErrorCode::BadRequest => "ERR_BAD_REQUEST",
            ErrorCode::BadResponse => "ERR_BAD_RESPONSE",
        }
    }

    /// Classify a status that was rejected by the validator.
    ///
    /// 4xx statuses are the caller's fault; everything else (5xx, but also a
    /// 2xx or 3xx that a custom validator refused) is reported as a bad
    /// response.
    pub fn from_status(status: u16) -> Self {
        if (400..500).contains(&status) {
            ErrorCode::BadRequest
        } else {
            ErrorCode::BadResponse
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECONNABORTED" => Ok(ErrorCode::ConnAborted),
            "ERR_NETWORK" => Ok(ErrorCode::Network),
            "ERR_BAD_REQUEST" => Ok(ErrorCode::BadRequest),
            "ERR_BAD_RESPONSE" => Ok(ErrorCode::BadResponse),
            other => Err(UnknownErrorCode(other.to_string())),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl PartialEq<&str> for ErrorCode {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
