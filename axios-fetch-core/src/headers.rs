//! Header normalization.
//!
//! Every header container in the client is an [`http::HeaderMap`]: lookups
//! are case-insensitive and names iterate in canonical lowercase.

use std::collections::{BTreeMap, HashMap};

use http::header::{HeaderMap, HeaderName, HeaderValue};

/// Invalid header name or value supplied through a plain mapping.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("invalid header name: {0}")]
    InvalidName(String),

    #[error("invalid value for header {name}")]
    InvalidValue { name: String },
}

/// Headers as supplied by a caller: either an already-built header container
/// or a plain name/value mapping.
///
/// Plain entries with an absent value are skipped during normalization.
#[derive(Clone, Debug)]
pub enum HeaderInput {
    Map(HeaderMap),
    Plain(Vec<(String, Option<String>)>),
}

impl From<HeaderMap> for HeaderInput {
    fn from(map: HeaderMap) -> Self {
        HeaderInput::Map(map)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for HeaderInput {
    fn from(pairs: [(K, V); N]) -> Self {
        HeaderInput::Plain(pairs.into_iter().map(|(k, v)| (k.into(), Some(v.into()))).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for HeaderInput {
    fn from(pairs: Vec<(K, V)>) -> Self {
        HeaderInput::Plain(pairs.into_iter().map(|(k, v)| (k.into(), Some(v.into()))).collect())
    }
}

impl From<HashMap<String, String>> for HeaderInput {
    fn from(map: HashMap<String, String>) -> Self {
        HeaderInput::Plain(map.into_iter().map(|(k, v)| (k, Some(v))).collect())
    }
}

impl From<BTreeMap<String, Option<String>>> for HeaderInput {
    fn from(map: BTreeMap<String, Option<String>>) -> Self {
        HeaderInput::Plain(map.into_iter().collect())
    }
}

/// Convert caller-supplied headers into one canonical container.
///
/// A later plain entry replaces an earlier one with the same name in any case.
///
/// # Example
///
/// ```
/// use axios_fetch_core::normalize_headers;
///
/// let headers = normalize_headers([("X-Token", "a"), ("x-token", "b")]).unwrap();
/// assert_eq!(headers.get("X-TOKEN").unwrap(), "b");
/// assert_eq!(headers.len(), 1);
/// ```
pub fn normalize_headers(input: impl Into<HeaderInput>) -> Result<HeaderMap, HeaderError> {
    match input.into() {
        HeaderInput::Map(map) => Ok(map),
        HeaderInput::Plain(pairs) => {
            let mut headers = HeaderMap::with_capacity(pairs.len());
            for (name, value) in pairs {
                let Some(value) = value else {
                    continue;
                };
                let (name, value) = parse_header(&name, &value)?;
                headers.insert(name, value);
            }
            Ok(headers)
        }
    }
}

/// Parse one header name/value pair.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HeaderError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| HeaderError::InvalidName(name.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| HeaderError::InvalidValue {
        name: name.to_string(),
    })?;
    Ok((header_name, header_value))
}

/// Set a header only if no header with that name exists yet.
///
/// Returns `true` when the value was inserted.
pub fn set_if_absent(headers: &mut HeaderMap, name: HeaderName, value: HeaderValue) -> bool {
    if headers.contains_key(&name) {
        return false;
    }
    headers.insert(name, value);
    true
}

/// Lay `top` over `base`, replacing every value of each name present in `top`.
pub fn overlay_headers(base: &mut HeaderMap, top: &HeaderMap) {
    for name in top.keys() {
        base.remove(name);
        for value in top.get_all(name) {
            base.append(name.clone(), value.clone());
        }
    }
}
