//! Client error types.
//!
//! This module provides:
//! - [`ClientError`]: the discriminated error produced by the dispatcher
//! - [`Error`]: everything a request can fail with
//! - [`is_axios_error`]: the discriminator check

use std::sync::Arc;
use std::time::Duration;

use axios_fetch_core::{ErrorCode, HeaderError};

use crate::config::RequestConfig;
use crate::response::Response;

/// An error raised by the dispatcher for one failed attempt.
///
/// Carries a machine-readable [`ErrorCode`], the config that triggered it,
/// and the response envelope when a reply was received.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    code: ErrorCode,
    config: RequestConfig,
    response: Option<Response>,
}

impl ClientError {
    /// The timeout elapsed before a reply arrived.
    pub(crate) fn timeout(timeout: Duration, config: RequestConfig) -> Self {
        Self {
            message: format!("timeout of {}ms exceeded", timeout.as_millis()),
            code: ErrorCode::ConnAborted,
            config,
            response: None,
        }
    }

    /// The transport failed without an interpretable reply.
    pub(crate) fn network(message: impl Into<String>, config: RequestConfig) -> Self {
        let message = message.into();
        Self {
            message: if message.is_empty() {
                "Network Error".to_string()
            } else {
                message
            },
            code: ErrorCode::Network,
            config,
            response: None,
        }
    }

    /// The validator rejected the reply's status.
    pub(crate) fn bad_status(response: Response) -> Self {
        Self {
            message: format!("Request failed with status code {}", response.status),
            code: ErrorCode::from_status(response.status),
            config: response.config.clone(),
            response: Some(response),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The config of the failed request.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// The reply, when one was received.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<Response> {
        self.response
    }

    /// Always `true`: the type itself is the discriminator.
    pub const fn is_axios_error(&self) -> bool {
        true
    }
}

/// Errors returned by client calls.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// A dispatcher error (timeout, network, rejected status).
    #[error("{0}")]
    Client(Box<ClientError>),

    /// The request config had no address.
    #[error("missing url in request config")]
    MissingUrl,

    /// A header name or value could not be parsed.
    #[error(transparent)]
    InvalidHeader(#[from] HeaderError),

    /// A transport failure not yet classified by the dispatcher.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other error, typically raised by an interceptor.
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Other(Arc::new(err))
    }

    /// Whether this error carries the client discriminator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Client(_))
    }

    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            Error::Client(err) => Some(&**err),
            _ => None,
        }
    }

    /// Get the error code, if this is a client error.
    pub fn code(&self) -> Option<ErrorCode> {
        self.as_client_error().map(ClientError::code)
    }

    /// Get the reply attached to a client error.
    pub fn response(&self) -> Option<&Response> {
        self.as_client_error().and_then(ClientError::response)
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        Error::Client(Box::new(err))
    }
}

/// Check whether an error carries the client discriminator.
///
/// Works on any error value: an [`Error::Client`] or a bare [`ClientError`]
/// returns `true`, everything else `false`.
///
/// # Example
///
/// ```
/// use axios_fetch::{Error, is_axios_error};
///
/// let err = Error::MissingUrl;
/// assert!(!is_axios_error(&err));
///
/// let io = std::io::Error::other("boom");
/// assert!(!is_axios_error(&io));
/// ```
pub fn is_axios_error(err: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(err) = err.downcast_ref::<Error>() {
        return err.is_client_error();
    }
    err.is::<ClientError>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{RequestInfo, ResponseData};
    use http::HeaderMap;

    fn response(status: u16) -> Response {
        Response {
            data: ResponseData::Empty,
            status,
            status_text: String::new(),
            headers: HeaderMap::new(),
            config: RequestConfig::new().url("/x"),
            request: RequestInfo::default(),
        }
    }

    #[test]
    fn test_timeout_error() {
        let err = ClientError::timeout(Duration::from_millis(50), RequestConfig::new());
        assert_eq!(err.code(), ErrorCode::ConnAborted);
        assert_eq!(err.to_string(), "timeout of 50ms exceeded");
        assert!(err.response().is_none());
    }

    #[test]
    fn test_network_error_default_message() {
        let err = ClientError::network("", RequestConfig::new());
        assert_eq!(err.code(), ErrorCode::Network);
        assert_eq!(err.message(), "Network Error");
    }

    #[test]
    fn test_bad_status_error() {
        let err = ClientError::bad_status(response(404));
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert_eq!(err.message(), "Request failed with status code 404");
        assert_eq!(err.response().unwrap().status, 404);
        assert_eq!(err.config().url.as_deref(), Some("/x"));

        let err = ClientError::bad_status(response(502));
        assert_eq!(err.code(), ErrorCode::BadResponse);
    }

    #[test]
    fn test_error_accessors() {
        let err: Error = ClientError::bad_status(response(500)).into();
        assert!(err.is_client_error());
        assert_eq!(err.code(), Some(ErrorCode::BadResponse));
        assert_eq!(err.response().map(|r| r.status), Some(500));

        assert!(!Error::MissingUrl.is_client_error());
        assert_eq!(Error::Transport("x".into()).code(), None);
    }

    #[test]
    fn test_is_axios_error() {
        let client: Error = ClientError::network("down", RequestConfig::new()).into();
        assert!(is_axios_error(&client));

        let bare = ClientError::network("down", RequestConfig::new());
        assert!(is_axios_error(&bare));

        assert!(!is_axios_error(&Error::Transport("x".into())));
        assert!(!is_axios_error(&Error::other(std::io::Error::other("io"))));
    }
}
