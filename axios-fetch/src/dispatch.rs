//! Request dispatcher.
//!
//! Performs exactly one attempt: resolve the config against the defaults,
//! hand it to the transport under the timeout, decode the body, then apply
//! the status validator. Failures come back as [`ClientError`]s.

use std::time::Duration;

use axios_fetch_core::Blob;
use bytes::Bytes;
use http::HeaderMap;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::time::timeout;

#[cfg(feature = "tracing")]
use tracing::Instrument;

use crate::config::{Defaults, RequestConfig, ResponseType};
use crate::error::{ClientError, Error};
use crate::response::{RequestInfo, Response, ResponseData};
use crate::transport::{FetchRequest, FetchResponse, Transport};

/// Dispatch one request.
///
/// `defaults` is the snapshot taken when the request reached the
/// dispatcher; later mutations of the instance do not affect it.
pub(crate) async fn dispatch_request(
    transport: &dyn Transport,
    defaults: &Defaults,
    config: RequestConfig,
) -> Result<Response, Error> {
    let resolved = defaults.resolve(&config)?;

    #[cfg(feature = "tracing")]
    let span = tracing::info_span!(
        "http.request",
        http.request.method = %resolved.method,
        url.full = %resolved.url,
        otel.kind = "client",
    );

    let wait = resolved.timeout;
    let response_type = resolved.response_type;
    let validate_status = resolved.validate_status.clone();
    let request = FetchRequest {
        method: resolved.method,
        url: resolved.url,
        headers: resolved.headers,
        body: resolved.body,
        credentials: resolved.credentials,
    };

    let attempt = async move {
        let reply = match fetch_with_timeout(transport, request, wait).await {
            Ok(reply) => reply,
            Err(Attempt::TimedOut) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(timeout_ms = wait.as_millis() as u64, "request timed out");
                return Err(ClientError::timeout(wait, config).into());
            }
            Err(Attempt::Failed(Error::Client(err))) => return Err(Error::Client(err)),
            Err(Attempt::Failed(err)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %err, "transport failed");
                let message = match err {
                    Error::Transport(message) => message,
                    other => other.to_string(),
                };
                return Err(ClientError::network(message, config).into());
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            http.response.status_code = reply.status,
            body_len = reply.body.len(),
            "response received"
        );

        let FetchResponse {
            status,
            status_text,
            headers,
            url,
            body,
        } = reply;
        let data = decode_body(status, &headers, body, response_type);
        let response = Response {
            data,
            status,
            status_text,
            headers,
            config,
            request: RequestInfo { response_url: url },
        };

        if !validate_status(status) {
            return Err(ClientError::bad_status(response).into());
        }
        Ok(response)
    };

    #[cfg(feature = "tracing")]
    return attempt.instrument(span).await;

    #[cfg(not(feature = "tracing"))]
    attempt.await
}

enum Attempt {
    TimedOut,
    Failed(Error),
}

/// Race the transport against the timer. Either way the loser is dropped,
/// which cancels the in-flight fetch or disarms the timer.
async fn fetch_with_timeout(
    transport: &dyn Transport,
    request: FetchRequest,
    wait: Duration,
) -> Result<FetchResponse, Attempt> {
    let fetch = transport.fetch(request);
    let reply = if wait.is_zero() {
        fetch.await
    } else {
        timeout(wait, fetch).await.map_err(|_| Attempt::TimedOut)?
    };
    reply.map_err(Attempt::Failed)
}

/// Decode a raw body according to the requested response type.
///
/// For JSON, a 204/205 status, `content-length: 0` or an empty body yields
/// [`ResponseData::Empty`]; a body that fails to parse is kept as text.
pub fn decode_body(status: u16, headers: &HeaderMap, body: Bytes, response_type: ResponseType) -> ResponseData {
    match response_type {
        ResponseType::ArrayBuffer => ResponseData::Binary(body),
        ResponseType::Blob => {
            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            ResponseData::Blob(Blob::new(body, content_type))
        }
        ResponseType::Text => ResponseData::Text(String::from_utf8_lossy(&body).into_owned()),
        ResponseType::Json => {
            let declared_empty = headers
                .get(CONTENT_LENGTH)
                .is_some_and(|value| value.as_bytes() == b"0");
            if status == 204 || status == 205 || declared_empty {
                return ResponseData::Empty;
            }
            let text = String::from_utf8_lossy(&body);
            if text.is_empty() {
                return ResponseData::Empty;
            }
            match serde_json::from_str(&text) {
                Ok(value) => ResponseData::Json(value),
                Err(_) => ResponseData::Text(text.into_owned()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FnTransport;
    use axios_fetch_core::ErrorCode;
    use http::HeaderValue;
    use serde_json::json;
    use std::sync::Arc;

    fn reply(status: u16, body: &'static str) -> FetchResponse {
        FetchResponse::new(status).body(body)
    }

    fn config(url: &str) -> RequestConfig {
        RequestConfig::new().url(url)
    }

    #[test]
    fn test_decode_json() {
        let data = decode_body(200, &HeaderMap::new(), Bytes::from_static(br#"{"a":1}"#), ResponseType::Json);
        assert_eq!(data, ResponseData::Json(json!({"a": 1})));
    }

    #[test]
    fn test_decode_json_falls_back_to_text() {
        let data = decode_body(200, &HeaderMap::new(), Bytes::from_static(b"not json"), ResponseType::Json);
        assert_eq!(data, ResponseData::Text("not json".into()));
    }

    #[test]
    fn test_decode_empty_cases() {
        let empty = HeaderMap::new();
        let body = Bytes::from_static(b"ignored");
        assert!(decode_body(204, &empty, body.clone(), ResponseType::Json).is_empty());
        assert!(decode_body(205, &empty, body.clone(), ResponseType::Json).is_empty());
        assert!(decode_body(200, &empty, Bytes::new(), ResponseType::Json).is_empty());

        let mut zero = HeaderMap::new();
        zero.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert!(decode_body(200, &zero, body, ResponseType::Json).is_empty());
    }

    #[test]
    fn test_decode_other_types() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        let body = Bytes::from_static(b"\x89PNG");

        assert_eq!(
            decode_body(200, &headers, body.clone(), ResponseType::ArrayBuffer),
            ResponseData::Binary(body.clone())
        );
        assert_eq!(
            decode_body(200, &headers, body.clone(), ResponseType::Blob),
            ResponseData::Blob(Blob::new(body, Some("image/png".into())))
        );
        assert_eq!(
            decode_body(204, &headers, Bytes::from_static(b"{}"), ResponseType::Text),
            ResponseData::Text("{}".into())
        );
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let transport = FnTransport::new(|request: FetchRequest| async move {
            assert_eq!(request.method, http::Method::GET);
            Ok(reply(200, r#"{"id":7}"#).url(request.url))
        });
        let defaults = Defaults::default();
        let response = dispatch_request(&transport, &defaults, config("https://api.test/items/7"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.data, ResponseData::Json(json!({"id": 7})));
        assert_eq!(response.request.response_url, "https://api.test/items/7");
        assert_eq!(response.config.url.as_deref(), Some("https://api.test/items/7"));
    }

    #[tokio::test]
    async fn test_dispatch_status_rejections() {
        let transport = FnTransport::new(|request: FetchRequest| async move {
            let status = if request.url.ends_with("404") { 404 } else { 500 };
            Ok(reply(status, r#"{"error":"nope"}"#))
        });
        let defaults = Defaults::default();

        let err = dispatch_request(&transport, &defaults, config("/404")).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::BadRequest));
        let response = err.response().unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.data, ResponseData::Json(json!({"error": "nope"})));

        let err = dispatch_request(&transport, &defaults, config("/500")).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::BadResponse));
        assert_eq!(err.to_string(), "Request failed with status code 500");
    }

    #[tokio::test]
    async fn test_dispatch_custom_validator() {
        let transport = FnTransport::new(|_request: FetchRequest| async move { Ok(reply(404, "")) });
        let defaults = Defaults::default();
        let response = dispatch_request(
            &transport,
            &defaults,
            config("/missing").validate_status(|status| status < 500),
        )
        .await
        .unwrap();
        assert_eq!(response.status, 404);
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_network_error() {
        let transport = FnTransport::new(|_request: FetchRequest| async move {
            Err(Error::Transport("connection refused".into()))
        });
        let err = dispatch_request(&transport, &Defaults::default(), config("/a"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Network));
        assert_eq!(err.to_string(), "connection refused");
        assert!(err.response().is_none());

        let silent = FnTransport::new(|_request: FetchRequest| async move { Err(Error::Transport(String::new())) });
        let err = dispatch_request(&silent, &Defaults::default(), config("/a"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Network Error");
    }

    #[tokio::test]
    async fn test_dispatch_passes_client_errors_through() {
        let transport = FnTransport::new(|_request: FetchRequest| async move {
            Err(ClientError::timeout(Duration::from_millis(1), RequestConfig::new().url("/inner")).into())
        });
        let err = dispatch_request(&transport, &Defaults::default(), config("/outer"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ConnAborted));
        assert_eq!(
            err.as_client_error().unwrap().config().url.as_deref(),
            Some("/inner")
        );
    }

    #[tokio::test]
    async fn test_dispatch_missing_url() {
        let transport = FnTransport::new(|_request: FetchRequest| async move { Ok(reply(200, "")) });
        let err = dispatch_request(&transport, &Defaults::default(), RequestConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingUrl));
        assert!(!err.is_client_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_timeout() {
        let transport = FnTransport::new(|_request: FetchRequest| std::future::pending());
        let started = tokio::time::Instant::now();
        let err = dispatch_request(
            &transport,
            &Defaults::default(),
            config("/slow").timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(60));
        assert_eq!(err.code(), Some(ErrorCode::ConnAborted));
        assert_eq!(err.to_string(), "timeout of 50ms exceeded");
        assert!(err.response().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_timeout_cancels_fetch() {
        let in_flight = Arc::new(());
        let witness = Arc::clone(&in_flight);
        let transport = FnTransport::new(move |_request: FetchRequest| {
            let guard = Arc::clone(&witness);
            async move {
                let _guard = guard;
                std::future::pending::<Result<FetchResponse, Error>>().await
            }
        });

        let _ = dispatch_request(
            &transport,
            &Defaults::default(),
            config("/slow").timeout(Duration::from_millis(50)),
        )
        .await;
        // Only the test and the closure hold the witness: the fetch was dropped.
        assert_eq!(Arc::strong_count(&in_flight), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_disables_timer() {
        let transport = FnTransport::new(|_request: FetchRequest| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(reply(200, "late"))
        });
        let response = dispatch_request(
            &transport,
            &Defaults::default(),
            config("/slow").timeout(Duration::ZERO),
        )
        .await
        .unwrap();
        assert_eq!(response.data, ResponseData::Text("late".into()));
    }
}
