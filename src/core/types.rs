use crate::core::errors::code_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar request parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            // `f64`'s Display is the shortest round-trip form and never uses exponents
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    // values past `i64::MAX` keep their decimal digits instead of wrapping
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
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

/// Request parameters, kept sorted by key.
///
/// The signature covers the exact encoded byte string, so the encoding must be
/// canonical: keys ascending, standard form encoding for every pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Insert only when the value is present
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First key holding a NaN or infinite float, which has no wire form
    pub fn non_finite_key(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(_, v)| matches!(v, ParamValue::Float(f) if !f.is_finite()))
            .map(|(k, _)| k.as_str())
    }

    /// Canonical `key=value&...` encoding used both for signing and for the wire
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, &value.to_string());
        }
        serializer.finish()
    }

    /// Parse a form-encoded query back into a parameter set; values come back as strings
    pub fn from_query_string(query: &str) -> Self {
        let params = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), ParamValue::Str(v.into_owned())))
            .collect();
        Self { params }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

/// Typed view over the venue's `{code, msg, data}` envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn code_string(&self) -> Option<String> {
        self.code.as_ref().and_then(code_string)
    }

    /// An absent code means no classification was possible, which is treated as success
    pub fn is_success(&self) -> bool {
        self.code_string().map_or(true, |code| code == "0")
    }
}

/// Lifecycle of a streaming connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Listening,
    Stopping,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Listening => "listening",
            Self::Stopping => "stopping",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_ignores_insertion_order() {
        let a = ParameterSet::new()
            .with("symbol", "BTC-USDT")
            .with("limit", 5)
            .with("timestamp", 1_700_000_000_000_i64);
        let b = ParameterSet::new()
            .with("timestamp", 1_700_000_000_000_i64)
            .with("symbol", "BTC-USDT")
            .with("limit", 5);

        assert_eq!(a.to_query_string(), b.to_query_string());
        assert_eq!(
            a.to_query_string(),
            "limit=5&symbol=BTC-USDT&timestamp=1700000000000"
        );
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(ParamValue::Float(0.1).to_string(), "0.1");
        assert_eq!(ParamValue::Float(1.0).to_string(), "1");
        assert_eq!(ParamValue::Float(30_000.5).to_string(), "30000.5");
        assert_eq!(ParamValue::Float(0.000_001).to_string(), "0.000001");
        assert_eq!(ParamValue::Float(1e21).to_string(), "1000000000000000000000");
    }

    #[test]
    fn test_values_are_form_encoded() {
        let params = ParameterSet::new()
            .with("note", "a b&c=d")
            .with("reduceOnly", true);
        assert_eq!(
            params.to_query_string(),
            "note=a+b%26c%3Dd&reduceOnly=true"
        );
    }

    #[test]
    fn test_query_round_trip() {
        let params = ParameterSet::new()
            .with("symbol", "BTC-USDT")
            .with("price", 30_000.25)
            .with("quantity", 0.001)
            .with("clientOrderId", "my order/1")
            .with("postOnly", false);

        let decoded = ParameterSet::from_query_string(&params.to_query_string());

        assert_eq!(decoded.len(), params.len());
        for (key, value) in params.iter() {
            assert_eq!(
                decoded.get(key),
                Some(&ParamValue::Str(value.to_string())),
                "mismatch for {}",
                key
            );
        }
    }

    #[test]
    fn test_large_unsigned_does_not_wrap() {
        let params = ParameterSet::new()
            .with("big", u64::MAX)
            .with("small", 7_u64);
        assert_eq!(params.get("small"), Some(&ParamValue::Int(7)));
        assert_eq!(
            params.to_query_string(),
            "big=18446744073709551615&small=7"
        );
    }

    #[test]
    fn test_non_finite_key() {
        let params = ParameterSet::new()
            .with("price", 1.5)
            .with("qty", f64::INFINITY)
            .with("stop", f64::NAN);
        assert_eq!(params.non_finite_key(), Some("qty"));
        assert_eq!(ParameterSet::new().with("price", 1.5).non_finite_key(), None);
    }

    #[test]
    fn test_insert_opt() {
        let mut params = ParameterSet::new();
        params.insert_opt("limit", Some(10));
        params.insert_opt::<i64>("startTime", None);
        assert!(params.contains_key("limit"));
        assert!(!params.contains_key("startTime"));
    }

    #[test]
    fn test_api_response_success() {
        let ok: ApiResponse = serde_json::from_str(r#"{"code":0,"msg":"","data":{}}"#).unwrap();
        assert!(ok.is_success());

        let bare: ApiResponse = serde_json::from_str(r#"{"listenKey":"abc"}"#).unwrap();
        assert!(bare.code.is_none());
        assert!(bare.is_success());

        let failed: ApiResponse = serde_json::from_str(r#"{"code":100001,"msg":"x"}"#).unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.code_string().as_deref(), Some("100001"));
    }
}
