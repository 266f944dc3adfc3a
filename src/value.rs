use std::{collections::BTreeMap, fmt};

use rust_decimal::Decimal;

use crate::{functions::Function, record::Record};

/// Boxed error returned by user-supplied functions and row sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A dynamic value flowing through templates, expressions and row binding.
///
/// Parameters handed to a statement, intermediate expression results and the
/// objects assembled from result rows are all `Value`s.
///
/// # Kinds
///
/// - `Null` is the empty state of every nil-able kind (list, map, record,
///   function) and the SQL `NULL`.
/// - Signed and unsigned integers are kept apart; comparisons between them
///   widen, arithmetic does not mix them.
/// - `Decimal` carries exact NUMERIC values and only combines with decimals.
///
/// # Examples
///
/// ```
/// use sqlmold::Value;
///
/// let ids = Value::from(vec![1, 2, 3]);
/// let params: Value = [("ids", ids), ("name", Value::from("alice"))]
///     .into_iter()
///     .collect();
///
/// assert_eq!(params.kind_name(), "map");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (nil pointer, nil list/map, SQL NULL)
    Null,

    /// Boolean
    Bool(bool),

    /// Signed integer
    Int(i64),

    /// Unsigned integer
    Uint(u64),

    /// Floating-point number
    Float(f64),

    /// Exact decimal number
    Decimal(Decimal),

    /// UTF-8 string
    String(String),

    /// Byte string (BLOB)
    Bytes(Vec<u8>),

    /// Sequence of values
    List(Vec<Value>),

    /// String-keyed mapping, iterated in key order
    Map(BTreeMap<String, Value>),

    /// Instance of a registered record type
    Record(Record),

    /// Callable value (builtin, user function or bound record method)
    Func(Function),
}

impl Value {
    /// Human-readable kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Func(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this kind may legitimately hold "no value" and therefore be
    /// compared against `nil`.
    pub fn is_nilable(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::List(_) | Value::Map(_) | Value::Record(_) | Value::Func(_)
        )
    }

    /// Condition truthiness.
    ///
    /// Booleans are taken as-is, numbers are true when nonzero and strings
    /// when non-empty. Every other kind has no truth value and yields `None`.
    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(n) => Some(*n != 0),
            Value::Uint(n) => Some(*n != 0),
            Value::Float(n) => Some(*n != 0.0),
            Value::Decimal(d) => Some(!d.is_zero()),
            Value::String(s) => Some(!s.is_empty()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a signed integer, accepting unsigned values that fit.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Number of elements for sized kinds (chars for strings).
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            Value::Null => Some(0),
            _ => None,
        }
    }
}

/// Canonical string form, used for raw `${}` substitution.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Record(record) => write!(f, "{}", record),
            Value::Func(func) => write!(f, "func {}", func.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(n as u64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Func(func)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert_eq!(Value::Bool(false).is_truthy(), Some(false));
        assert_eq!(Value::Int(-3).is_truthy(), Some(true));
        assert_eq!(Value::Uint(0).is_truthy(), Some(false));
        assert_eq!(Value::String(String::new()).is_truthy(), Some(false));
        assert_eq!(Value::Null.is_truthy(), None);
        assert_eq!(Value::List(vec![]).is_truthy(), None);
    }

    #[test]
    fn test_display_canonical_form() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::from("users").to_string(), "users");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
    }
}
