//! Scalar values bound into or inlined in SQL

use serde::{Deserialize, Serialize};

/// A scalar SQL value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Convert a JSON scalar; arrays and objects have no scalar form
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(SqlValue::Null),
            serde_json::Value::Bool(b) => Some(SqlValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(SqlValue::Int(i))
                } else {
                    n.as_f64().map(SqlValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(SqlValue::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Text form used for pattern matching
    pub fn to_text(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        assert_eq!(SqlValue::from_json(&json!(null)), Some(SqlValue::Null));
        assert_eq!(SqlValue::from_json(&json!(7)), Some(SqlValue::Int(7)));
        assert_eq!(SqlValue::from_json(&json!(2.5)), Some(SqlValue::Float(2.5)));
        assert_eq!(SqlValue::from_json(&json!("x")), Some(SqlValue::Text("x".into())));
        assert_eq!(SqlValue::from_json(&json!([1])), None);
    }

    #[test]
    fn test_params_serialize_as_plain_json() {
        let params = vec![SqlValue::Int(1), SqlValue::Text("a".into()), SqlValue::Null];
        assert_eq!(serde_json::to_string(&params).unwrap(), "[1,\"a\",null]");
    }
}
