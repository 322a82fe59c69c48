//! Request payloads and the body encoder.
//!
//! A payload is classified purely by its kind, first match wins:
//!
//! | Kind | Body | Content-Type defaulted |
//! |------|------|------------------------|
//! | text | verbatim | no |
//! | multipart form | verbatim | no (transport adds the boundary) |
//! | URL-encoded params | verbatim | `application/x-www-form-urlencoded;charset=UTF-8` |
//! | binary / blob | verbatim | no |
//! | anything else | JSON text | `application/json;charset=UTF-8` |

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use http::Method;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::headers::set_if_absent;

/// Content type defaulted for JSON payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Content type defaulted for URL-encoded payloads.
pub const FORM_URLENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Content type a fetch primitive applies to text bodies sent without one.
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

const OCTET_STREAM: &str = "application/octet-stream";

/// Whether requests with this method may carry a body.
///
/// `GET` and `HEAD` never do, even when a payload was supplied.
pub fn method_allows_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Encode a payload into a transport body.
///
/// Defaults the content type (set-if-absent) for URL-encoded and JSON
/// payloads; a caller-supplied content type is never overridden. Returns
/// `None` for body-less methods, a missing payload, or a JSON `null`.
pub fn encode_body(method: &Method, data: Option<RequestData>, headers: &mut HeaderMap) -> Option<Body> {
    if !method_allows_body(method) {
        return None;
    }
    let body = match data? {
        RequestData::Text(text) => Body::Text(text),
        RequestData::Form(form) => Body::Form(form),
        RequestData::UrlEncoded(params) => {
            set_if_absent(
                headers,
                CONTENT_TYPE,
                HeaderValue::from_static(FORM_URLENCODED_CONTENT_TYPE),
            );
            Body::UrlEncoded(params)
        }
        RequestData::Binary(bytes) => Body::Binary(bytes),
        RequestData::Blob(blob) => Body::Blob(blob),
        RequestData::Json(Value::Null) => return None,
        RequestData::Json(Value::String(text)) => Body::Text(text),
        RequestData::Json(value) => {
            set_if_absent(headers, CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            Body::Text(value.to_string())
        }
    };
    Some(body)
}

/// A request payload as supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestData {
    Text(String),
    Form(FormData),
    UrlEncoded(UrlSearchParams),
    Binary(Bytes),
    Blob(Blob),
    /// Any other value, sent as JSON.
    Json(Value),
}

impl RequestData {
    /// Build a JSON payload from any serializable value.
    ///
    /// A value that serializes to a JSON string is sent as text, the same
    /// way a plain string payload would be.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(RequestData::from)
    }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self {
        RequestData::Text(text.to_string())
    }
}

impl From<String> for RequestData {
    fn from(text: String) -> Self {
        RequestData::Text(text)
    }
}

impl From<FormData> for RequestData {
    fn from(form: FormData) -> Self {
        RequestData::Form(form)
    }
}

impl From<UrlSearchParams> for RequestData {
    fn from(params: UrlSearchParams) -> Self {
        RequestData::UrlEncoded(params)
    }
}

impl From<Bytes> for RequestData {
    fn from(bytes: Bytes) -> Self {
        RequestData::Binary(bytes)
    }
}

impl From<Vec<u8>> for RequestData {
    fn from(bytes: Vec<u8>) -> Self {
        RequestData::Binary(Bytes::from(bytes))
    }
}

impl From<Blob> for RequestData {
    fn from(blob: Blob) -> Self {
        RequestData::Blob(blob)
    }
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RequestData::Text(text),
            other => RequestData::Json(other),
        }
    }
}

/// An encoded request body, ready for a transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Text(String),
    Form(FormData),
    UrlEncoded(UrlSearchParams),
    Binary(Bytes),
    Blob(Blob),
}

/// Raw bytes of a body plus the content type a fetch primitive would apply
/// when the request has none.
#[derive(Clone, Debug, PartialEq)]
pub struct Payload {
    pub bytes: Bytes,
    pub implicit_content_type: Option<String>,
}

impl Body {
    /// Serialize the body.
    ///
    /// `boundary` is only used for multipart forms.
    pub fn into_payload(self, boundary: &str) -> Payload {
        match self {
            Body::Text(text) => Payload {
                bytes: Bytes::from(text),
                implicit_content_type: Some(TEXT_CONTENT_TYPE.to_string()),
            },
            Body::Form(form) => Payload {
                bytes: form.encode_multipart(boundary),
                implicit_content_type: Some(format!("multipart/form-data; boundary={}", boundary)),
            },
            Body::UrlEncoded(params) => Payload {
                bytes: Bytes::from(params.to_string()),
                implicit_content_type: Some(FORM_URLENCODED_CONTENT_TYPE.to_string()),
            },
            Body::Binary(bytes) => Payload {
                bytes,
                implicit_content_type: None,
            },
            Body::Blob(blob) => Payload {
                implicit_content_type: blob.content_type.filter(|t| !t.is_empty()),
                bytes: blob.data,
            },
        }
    }
}

/// A binary object with an optional media type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Blob {
    data: Bytes,
    content_type: Option<String>,
}

impl Blob {
    /// Wrap raw bytes. An empty or missing media type leaves the content type
    /// to the caller.
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }

    /// The raw bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The media type, if one was given.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// An ordered list of URL-encoded name/value pairs.
///
/// `Display` renders `application/x-www-form-urlencoded` text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UrlSearchParams {
    pairs: Vec<(String, String)>,
}

impl UrlSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse URL-encoded text. A leading `?` is ignored.
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('?').unwrap_or(input);
        form_urlencoded::parse(input.as_bytes()).into_owned().collect()
    }

    pub fn append(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for UrlSearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlSearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One field of a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub enum FormValue {
    Text(String),
    File { filename: String, blob: Blob },
}

/// A multipart form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: impl Into<String>, filename: impl Into<String>, blob: Blob) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                filename: filename.into(),
                blob,
            },
        ));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode as `multipart/form-data` with the given boundary.
    pub fn encode_multipart(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();
        for (name, value) in &self.fields {
            buf.put_slice(format!("--{}\r\n", boundary).as_bytes());
            match value {
                FormValue::Text(text) => {
                    buf.put_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape_quoted(name)
                        )
                        .as_bytes(),
                    );
                    buf.put_slice(text.as_bytes());
                }
                FormValue::File { filename, blob } => {
                    buf.put_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            escape_quoted(name),
                            escape_quoted(filename)
                        )
                        .as_bytes(),
                    );
                    let content_type = blob.content_type().filter(|t| !t.is_empty()).unwrap_or(OCTET_STREAM);
                    buf.put_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
                    buf.put_slice(blob.data());
                }
            }
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{}--\r\n", boundary).as_bytes());
        buf.freeze()
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
