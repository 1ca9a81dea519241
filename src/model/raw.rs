use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row exactly as the backend returned it. Nothing about its field names
/// or value types is trusted; canonical records are built from it through
/// their `From<&RawRecord>` impls and nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Textual form of a scalar field. `null`, empty strings and
    /// containers count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The first of `keys` that holds a present value.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_i64().unwrap_or(0) != 0),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn nested(&self, key: &str) -> Option<RawRecord> {
        match self.0.get(key)? {
            Value::Object(map) => Some(Self(map.clone())),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn text_treats_null_and_empty_as_absent() {
        let r = raw(json!({ "a": null, "b": "", "c": "x" }));
        assert_eq!(r.text("a"), None);
        assert_eq!(r.text("b"), None);
        assert_eq!(r.text("c"), Some("x".into()));
        assert_eq!(r.text("missing"), None);
    }

    #[test]
    fn text_renders_scalars() {
        let r = raw(json!({ "n": 42, "f": 1.5, "b": true, "arr": [1] }));
        assert_eq!(r.text("n"), Some("42".into()));
        assert_eq!(r.text("f"), Some("1.5".into()));
        assert_eq!(r.text("b"), Some("true".into()));
        assert_eq!(r.text("arr"), None);
    }

    #[test]
    fn first_text_skips_absent_keys() {
        let r = raw(json!({ "type": "", "ticket_type": "bug" }));
        assert_eq!(r.first_text(&["type", "ticket_type"]), Some("bug".into()));
    }

    #[test]
    fn number_and_flag_accept_strings() {
        let r = raw(json!({ "hours": "2.5", "read": "true", "zero": 0 }));
        assert_eq!(r.number("hours"), Some(2.5));
        assert_eq!(r.flag("read"), Some(true));
        assert_eq!(r.flag("zero"), Some(false));
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(RawRecord::from_value(json!([1, 2])).is_none());
        assert!(RawRecord::from_value(json!("x")).is_none());
        assert!(RawRecord::from_value(json!({})).unwrap().is_empty());
    }
}
