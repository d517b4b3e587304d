use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

/// A single cell, either decoded from a request body or read from a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

/// Column name to value. Keys are serialized in sorted order.
pub type Record = BTreeMap<String, Value>;

impl Value {
    /// Convert a JSON value. Booleans, arrays and objects have no
    /// counterpart and yield `None`.
    pub fn from_json(json: JsonValue) -> Option<Self> {
        match json {
            JsonValue::Null => Some(Self::Null),
            JsonValue::String(s) => Some(Self::Text(s)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            JsonValue::Bool(_) | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_kinds() {
        assert_eq!(Value::from_json(json!(7)), Some(Value::Integer(7)));
        assert_eq!(Value::from_json(json!(1.5)), Some(Value::Float(1.5)));
        assert_eq!(Value::from_json(json!("pen")), Some(Value::Text("pen".into())));
        assert_eq!(Value::from_json(JsonValue::Null), Some(Value::Null));
        assert_eq!(Value::from_json(json!(true)), None);
        assert_eq!(Value::from_json(json!([1, 2])), None);
        assert_eq!(Value::from_json(json!({"a": 1})), None);
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let v = Value::from_json(json!(u64::MAX)).unwrap();
        assert!(matches!(v, Value::Float(_)));
    }

    #[test]
    fn test_record_serializes_plain_json() {
        let mut record = Record::new();
        record.insert("id".into(), Value::Integer(1));
        record.insert("title".into(), Value::from("pen"));
        record.insert("price".into(), Value::Float(1.5));
        record.insert("note".into(), Value::Null);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            json!({"id": 1, "title": "pen", "price": 1.5, "note": null})
        );
    }
}
