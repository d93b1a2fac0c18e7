//! Conversions between [`Value`] and `serde_json::Value`

use crate::types::Value;

// ============================================================================
// Conversions
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 above i64::MAX and fractional numbers
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => {
                serde_json::Value::Array(b.into_iter().map(|byte| byte.into()).collect())
            }
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (key, v.into())
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"id": 7, "score": 1.5, "tags": ["a", null], "ok": true}));
        let Value::Map(entries) = value else {
            panic!("expected a mapping");
        };
        let get = |name: &str| {
            entries
                .iter()
                .find(|(k, _)| k == &Value::string(name))
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("id"), Some(Value::Int(7)));
        assert_eq!(get("score"), Some(Value::Float(1.5)));
        assert_eq!(get("ok"), Some(Value::Bool(true)));
        assert_eq!(
            get("tags"),
            Some(Value::List(vec![Value::string("a"), Value::Null]))
        );
    }

    #[test]
    fn test_to_json() {
        assert_eq!(serde_json::Value::from(Value::Float(f64::NAN)), json!(null));
        assert_eq!(serde_json::Value::from(Value::Bytes(vec![1, 2])), json!([1, 2]));
        assert_eq!(
            serde_json::Value::from(Value::Tuple(vec![Value::Int(1), Value::string("x")])),
            json!([1, "x"])
        );
        assert_eq!(
            serde_json::Value::from(Value::Map(vec![(Value::Int(1), Value::Bool(false))])),
            json!({"1": false})
        );
    }
}
