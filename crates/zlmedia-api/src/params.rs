//! Request parameter set and its builder.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::ser::{self, Serialize, Serializer};

/// A scalar request parameter value.
///
/// Serializes as a bare JSON scalar. A non-finite [`Float`](Self::Float)
/// has no JSON form and fails to serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value, stringified as `true`/`false` on the query string.
    ///
    /// Endpoint flags never use this variant; they are encoded as `"1"`/`"0"`
    /// strings by [`ParamsBuilder::flag`].
    Bool(bool),
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Self::Float(x) => Err(ser::Error::custom(format!(
                "non-finite number {x} cannot be sent"
            ))),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(String::from(value))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Parameter set sent with one API call.
///
/// Keys are kept sorted so query strings and JSON bodies are deterministic.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a builder.
    #[must_use]
    pub const fn builder() -> ParamsBuilder {
        ParamsBuilder::new()
    }

    /// Inserts or replaces a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Returns `true` if the parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    /// Flattens the set into `(name, text)` pairs for URL encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if a float parameter is NaN or infinite, matching
    /// what the JSON body encoding rejects.
    pub(crate) fn to_query_pairs(&self) -> Result<Vec<(&str, String)>, serde_json::Error> {
        self.0
            .iter()
            .map(|(name, value)| match value {
                ParamValue::Float(x) if !x.is_finite() => {
                    Err(<serde_json::Error as ser::Error>::custom(format!(
                        "parameter {name}: non-finite number {x} cannot be sent"
                    )))
                }
                _ => Ok((name.as_str(), value.to_string())),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> Extend<(K, V)> for Params {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

/// Encodes a boolean flag the way the server expects it.
#[must_use]
pub const fn flag_value(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Builds a [`Params`] from required, optional, and flag fields.
///
/// Optional fields are omitted when `None`; a `Some("")` is still sent,
/// since the server treats an empty value differently from an absent one.
#[derive(Debug, Default)]
#[must_use]
pub struct ParamsBuilder {
    params: Params,
}

impl ParamsBuilder {
    /// Creates an empty builder.
    pub const fn new() -> Self {
        Self {
            params: Params::new(),
        }
    }

    /// Adds a field that is always sent.
    pub fn required(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Adds a field only when it is set.
    pub fn optional<V: Into<ParamValue>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.insert(name, v);
        }
        self
    }

    /// Adds a boolean flag as `"1"`/`"0"` only when it is set.
    pub fn flag(mut self, name: &str, value: Option<bool>) -> Self {
        if let Some(v) = value {
            self.params.insert(name, flag_value(v));
        }
        self
    }

    /// Adds free-form entries (dynamic keys).
    pub fn extend<K, V, I>(mut self, entries: I) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.params.extend(entries);
        self
    }

    /// Finishes the parameter set.
    #[must_use]
    pub fn build(self) -> Params {
        self.params
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_flag_encodes_one_and_zero() {
        // Arrange & Act
        let params = Params::builder()
            .flag("enable_hls", Some(true))
            .flag("enable_mp4", Some(false))
            .build();

        // Assert
        assert_eq!(params.get("enable_hls"), Some(&ParamValue::from("1")));
        assert_eq!(params.get("enable_mp4"), Some(&ParamValue::from("0")));
    }

    #[test]
    fn test_unset_flag_and_optional_are_absent() {
        // Arrange & Act
        let params = Params::builder()
            .flag("force", None)
            .optional::<i32>("retry_count", None)
            .optional::<String>("peer_ip", None)
            .build();

        // Assert
        assert!(params.is_empty());
    }

    #[test]
    fn test_optional_empty_string_is_sent() {
        // Arrange & Act
        let params = Params::builder()
            .optional("mp4_save_path", Some(""))
            .build();

        // Assert
        assert_eq!(params.get("mp4_save_path"), Some(&ParamValue::from("")));
    }

    #[test]
    fn test_numeric_values_keep_their_type() {
        // Arrange & Act
        let params = Params::builder()
            .required("port", 0_u16)
            .optional("timeout_sec", Some(2.5))
            .build();

        // Assert
        assert_eq!(params.get("port"), Some(&ParamValue::Int(0)));
        assert_eq!(params.get("timeout_sec"), Some(&ParamValue::Float(2.5)));
    }

    #[test]
    fn test_display_uses_default_formatting() {
        // Arrange & Act & Assert
        assert_eq!(ParamValue::Int(-3).to_string(), "-3");
        assert_eq!(ParamValue::Float(10.0).to_string(), "10");
        assert_eq!(ParamValue::Float(0.25).to_string(), "0.25");
        assert_eq!(ParamValue::Bool(true).to_string(), "true");
        assert_eq!(ParamValue::from("live").to_string(), "live");
    }

    #[test]
    fn test_serialize_as_json_scalars() {
        // Arrange
        let params = Params::builder()
            .required("app", "live")
            .required("dst_port", 10_000_i32)
            .required("timeout_sec", 1.5)
            .required("raw", true)
            .build();

        // Act
        let json = serde_json::to_value(&params).unwrap();

        // Assert
        assert_eq!(
            json,
            serde_json::json!({"app": "live", "dst_port": 10000, "timeout_sec": 1.5, "raw": true})
        );
    }

    #[test]
    fn test_extend_with_dynamic_keys() {
        // Arrange
        let entries = vec![("api.apiDebug", "0"), ("hls.segDur", "2")];

        // Act
        let params = Params::builder().extend(entries).build();

        // Assert
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("hls.segDur"), Some(&ParamValue::from("2")));
    }

    #[test]
    fn test_query_pairs_are_sorted_by_name() {
        // Arrange
        let params: Params = [("stream", "test"), ("app", "live")].into_iter().collect();

        // Act
        let pairs = params.to_query_pairs().unwrap();

        // Assert
        assert_eq!(
            pairs,
            vec![("app", String::from("live")), ("stream", String::from("test"))]
        );
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        // Arrange
        let nan = Params::builder().required("timeout_sec", f64::NAN).build();
        let inf = Params::builder()
            .required("app", "live")
            .required("timeout_sec", f64::INFINITY)
            .build();

        // Act
        let json = serde_json::to_vec(&nan);
        let query = inf.to_query_pairs();

        // Assert
        assert!(json.unwrap_err().to_string().contains("non-finite number NaN"));
        assert!(query.unwrap_err().to_string().contains("parameter timeout_sec"));
    }
}
