//! JSON <-> [`Value`] conversion, and typed decoding of bound results.

use serde::{Serialize, de::DeserializeOwned};

use crate::value::Value;

/// Convert serde_json::Value to Value
pub fn from_json(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::Uint(u)
            } else {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(from_json).collect()),
        serde_json::Value::Object(obj) => {
            Value::Map(obj.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

/// Convert Value to serde_json::Value
///
/// Records become objects keyed by member name. Decimals become strings so
/// no digits are lost, bytes become arrays of numbers and functions become
/// their name.
pub fn to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Uint(u) => serde_json::Value::Number((*u).into()),
        Value::Float(f) => float_to_json(*f),
        Value::Decimal(d) => serde_json::Value::String(d.to_string()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(bytes) => {
            serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
        Value::Record(record) => serde_json::Value::Object(
            record
                .entries()
                .map(|(field, v)| (field.name().to_string(), to_json(v)))
                .collect(),
        ),
        Value::Func(func) => serde_json::Value::String(func.name().to_string()),
    }
}

fn float_to_json(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

/// Decode a bound value into a typed struct.
///
/// ```
/// use serde::Deserialize;
/// use sqlmold::{json, Value};
///
/// #[derive(Deserialize)]
/// struct User {
///     #[serde(rename = "ID")]
///     id: i64,
/// }
///
/// let row: Value = [("ID", 7)].into_iter().collect();
/// let user: User = json::decode(&row).unwrap();
/// assert_eq!(user.id, 7);
/// ```
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(to_json(value))
}

/// Encode any serializable value as a statement parameter.
pub fn encode<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value).map(from_json)
}
