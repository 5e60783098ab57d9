//! Parameter sets and their wire encodings.
//!
//! # Design
//! `Parameters` is an insertion-ordered list rather than a hash map: the
//! default encoding must follow insertion order, and sets are small. Values
//! are `serde_json::Value` so callers can pass numbers, booleans or nested
//! data; `render_value` turns them into the text placed on the wire.
//!
//! The default encoders perform no escaping. Callers with reserved characters
//! in keys or values escape them first or register a serializer hook.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::RequestError;

/// Caller-supplied replacement for the default parameter encoding.
pub type Serializer = Arc<dyn Fn(&Parameters) -> String + Send + Sync>;

/// Ordered key/value data encoded into a query string or request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, Value)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from pairs, failing on the first repeated key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value)?;
        }
        Ok(params)
    }

    /// Append a parameter. An existing key is never overwritten.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), RequestError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(RequestError::DuplicateParameter(key));
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Text placed on the wire for a parameter value.
///
/// Strings go out verbatim, `null` as nothing, anything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

struct Pairs<'a>(&'a Parameters);

impl fmt::Display for Pairs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={}", render_value(value))?;
        }
        Ok(())
    }
}

/// Default GET encoding: `?k1=v1&k2=v2`, or `""` for an empty set.
pub fn encode_query(params: &Parameters) -> String {
    if params.is_empty() {
        return String::new();
    }
    format!("?{}", Pairs(params))
}

/// Default POST encoding: `k1=v1&k2=v2`.
pub fn encode_body(params: &Parameters) -> String {
    Pairs(params).to_string()
}

/// A serializer hook encoding the set as a JSON object in insertion order.
pub fn json_serializer() -> Serializer {
    Arc::new(|params: &Parameters| {
        let object: Map<String, Value> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Value::Object(object).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_rejects_duplicate_key() {
        let mut params = Parameters::new();
        params.insert("a", "1").unwrap();
        let err = params.insert("a", "2").unwrap_err();
        assert_eq!(err, RequestError::DuplicateParameter("a".to_string()));
        assert_eq!(params.get("a"), Some(&json!("1")));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn from_pairs_stops_at_duplicate() {
        let err = Parameters::from_pairs([("x", "1"), ("y", "2"), ("x", "3")]).unwrap_err();
        assert!(matches!(err, RequestError::DuplicateParameter(k) if k == "x"));
    }

    #[test]
    fn query_has_leading_question_mark_and_separators() {
        let params = Parameters::from_pairs([("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
        let query = encode_query(&params);
        assert_eq!(query, "?a=1&b=2&c=3");
        assert_eq!(query.matches('&').count(), params.len() - 1);
        assert_eq!(query.matches('?').count(), 1);
    }

    #[test]
    fn body_has_no_question_mark() {
        let params = Parameters::from_pairs([("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(encode_body(&params), "a=1&b=2");
    }

    #[test]
    fn empty_set_encodes_to_nothing() {
        let params = Parameters::new();
        assert_eq!(encode_query(&params), "");
        assert_eq!(encode_body(&params), "");
    }

    #[test]
    fn insertion_order_is_kept() {
        let params = Parameters::from_pairs([("z", "1"), ("a", "2"), ("m", "3")]).unwrap();
        assert_eq!(encode_body(&params), "z=1&a=2&m=3");
    }

    #[test]
    fn values_are_rendered_without_quotes() {
        let mut params = Parameters::new();
        params.insert("s", "text").unwrap();
        params.insert("n", 42).unwrap();
        params.insert("b", true).unwrap();
        params.insert("none", Value::Null).unwrap();
        assert_eq!(encode_body(&params), "s=text&n=42&b=true&none=");
    }

    #[test]
    fn reserved_characters_are_not_escaped() {
        let params = Parameters::from_pairs([("q", "a b&c")]).unwrap();
        assert_eq!(encode_query(&params), "?q=a b&c");
    }

    #[test]
    fn clear_empties_the_set() {
        let mut params = Parameters::from_pairs([("a", "1")]).unwrap();
        params.clear();
        assert!(params.is_empty());
        params.insert("a", "2").unwrap();
        assert_eq!(params.get("a"), Some(&json!("2")));
    }

    #[test]
    fn json_serializer_keeps_order_and_types() {
        let mut params = Parameters::new();
        params.insert("name", "milk").unwrap();
        params.insert("count", 2).unwrap();
        let encoded = json_serializer()(&params);
        assert_eq!(encoded, r#"{"name":"milk","count":2}"#);
    }
}
