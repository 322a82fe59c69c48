//! Response envelope.
//!
//! A [`Response`] is produced once per dispatched request and handed to the
//! response interceptors, then to the caller.

use axios_fetch_core::Blob;
use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::RequestConfig;

/// Decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    /// No content (204, 205, `content-length: 0`, or an empty JSON body).
    Empty,
    Json(Value),
    Text(String),
    Binary(Bytes),
    Blob(Blob),
}

impl ResponseData {
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseData::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Raw bytes of a binary or blob body.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Binary(bytes) => Some(bytes),
            ResponseData::Blob(blob) => Some(blob.data()),
            _ => None,
        }
    }
}

/// Information about the request that produced a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Final address reported by the transport.
    pub response_url: String,
}

/// The result of one successful request.
///
/// # Example
///
/// ```ignore
/// let response = client.get("/users/1").await?;
/// assert_eq!(response.status, 200);
///
/// #[derive(serde::Deserialize)]
/// struct User { name: String }
/// let user: User = response.json()?;
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub data: ResponseData,
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    /// The config the request was dispatched with.
    pub config: RequestConfig,
    pub request: RequestInfo,
}

impl Response {
    /// Get a response header as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Deserialize the body into `T`.
    ///
    /// An empty body deserializes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            ResponseData::Empty => serde_json::from_value(Value::Null),
            ResponseData::Json(value) => T::deserialize(value),
            ResponseData::Text(text) => serde_json::from_str(text),
            ResponseData::Binary(bytes) => serde_json::from_slice(bytes),
            ResponseData::Blob(blob) => serde_json::from_slice(blob.data()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
    }

    fn response(data: ResponseData) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());
        Response {
            data,
            status: 200,
            status_text: "OK".into(),
            headers,
            config: RequestConfig::new(),
            request: RequestInfo::default(),
        }
    }

    #[test]
    fn test_json_from_value() {
        let response = response(ResponseData::Json(json!({"name": "ada"})));
        let user: User = response.json().unwrap();
        assert_eq!(user.name, "ada");
    }

    #[test]
    fn test_json_from_text_and_bytes() {
        let text = response(ResponseData::Text(r#"{"name":"bob"}"#.into()));
        assert_eq!(text.json::<User>().unwrap().name, "bob");

        let bytes = response(ResponseData::Binary(Bytes::from_static(br#"{"name":"eve"}"#)));
        assert_eq!(bytes.json::<User>().unwrap().name, "eve");
    }

    #[test]
    fn test_json_from_empty() {
        let empty = response(ResponseData::Empty);
        assert_eq!(empty.json::<Option<User>>().unwrap(), None);
        assert!(empty.json::<User>().is_err());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = response(ResponseData::Empty);
        assert_eq!(response.header("X-Request-Id"), Some("abc"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn test_data_accessors() {
        let blob = ResponseData::Blob(Blob::new(Bytes::from_static(b"raw"), None));
        assert_eq!(blob.as_bytes().unwrap().as_ref(), b"raw");
        assert!(blob.as_json().is_none());
        assert_eq!(ResponseData::Text("t".into()).as_text(), Some("t"));
        assert!(ResponseData::Empty.is_empty());
    }
}
