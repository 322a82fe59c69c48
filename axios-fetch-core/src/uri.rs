//! URL resolution and query-string serialization.
//!
//! - [`combine_url`]: joins a base address with a relative path
//! - [`build_url`]: appends serialized [`Params`] to an address
//! - [`serialize_params`]: the default query serializer

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use url::form_urlencoded;

/// A caller-supplied query serializer.
///
/// When set on the defaults or on a single request it replaces
/// [`serialize_params`] entirely.
pub type ParamsSerializer = Arc<dyn Fn(&Params) -> String + Send + Sync>;

/// Check whether `url` is absolute (`scheme://…` or protocol-relative `//…`).
///
/// The scheme is matched case-insensitively.
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some((scheme, rest)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid_scheme && rest.starts_with("//")
}

/// Combine a base address with a path.
///
/// An absolute `path` is returned unchanged and the base is ignored. Otherwise
/// the two halves are joined with exactly one `/` between them.
///
/// # Example
///
/// ```
/// use axios_fetch_core::combine_url;
///
/// assert_eq!(combine_url("https://api.test/", "/users"), "https://api.test/users");
/// assert_eq!(combine_url("https://api.test", "users"), "https://api.test/users");
/// assert_eq!(combine_url("https://api.test", "https://other.test/x"), "https://other.test/x");
/// ```
pub fn combine_url(base: &str, path: &str) -> String {
    if base.is_empty() || is_absolute_url(path) {
        return path.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Append serialized query parameters to `url`.
///
/// Returns `url` unchanged when there are no params or they serialize to an
/// empty string. Uses `?` when the address has no query yet, `&` otherwise.
pub fn build_url(url: &str, params: Option<&Params>, serializer: Option<&ParamsSerializer>) -> String {
    let Some(params) = params else {
        return url.to_string();
    };
    let serialized = match serializer {
        Some(serialize) => serialize(params),
        None => serialize_params(params),
    };
    if serialized.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, serialized)
}

/// The default query serializer.
///
/// - null values are skipped
/// - dates are rendered as ISO-8601 with millisecond precision
/// - lists repeat the key once per element
/// - objects are rendered as JSON text
/// - everything else is stringified
///
/// Output is `application/x-www-form-urlencoded`.
pub fn serialize_params(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter() {
        append_param(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_param(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &ParamValue) {
    match value {
        ParamValue::Null => {}
        ParamValue::Date(date) => {
            serializer.append_pair(key, &date.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        ParamValue::List(items) => {
            for item in items {
                append_param(serializer, key, item);
            }
        }
        ParamValue::Value(value) => match value {
            Value::Null => {}
            Value::String(s) => {
                serializer.append_pair(key, s);
            }
            Value::Array(items) => {
                for item in items {
                    append_param(serializer, key, &ParamValue::from(item.clone()));
                }
            }
            other => {
                serializer.append_pair(key, &other.to_string());
            }
        },
    }
}

/// A single query parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Skipped during serialization.
    Null,
    /// Rendered as an ISO-8601 timestamp.
    Date(DateTime<Utc>),
    /// Each element is emitted under the same key.
    List(Vec<ParamValue>),
    /// Any JSON value. Objects are emitted as JSON text.
    Value(Value),
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Array(items) => ParamValue::List(items.into_iter().map(ParamValue::from).collect()),
            other => ParamValue::Value(other),
        }
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(date: DateTime<Utc>) -> Self {
        ParamValue::Date(date)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Value(Value::String(s.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Value(Value::String(s))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Value(Value::Bool(b))
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Value(Value::from(n))
    }
}

impl From<u64> for ParamValue {
    fn from(n: u64) -> Self {
        ParamValue::Value(Value::from(n))
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Value(Value::from(n))
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Value(Value::from(n))
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Null, Into::into)
    }
}

/// Ordered query parameters.
///
/// # Example
///
/// ```
/// use axios_fetch_core::{Params, serialize_params};
///
/// let params = Params::new().insert("q", "rust").insert("page", 2);
/// assert_eq!(serialize_params(&params), "q=rust&page=2");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// Create an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, returning the list.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Add a parameter in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters, null ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Objects become one parameter per key, in the object's key order; any other
/// JSON value yields no parameters.
impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().map(|(k, v)| (k, ParamValue::from(v))).collect(),
            _ => Params::default(),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
