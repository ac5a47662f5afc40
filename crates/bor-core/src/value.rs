//! The closed value domain accepted by the proof engine.
//!
//! Every step input, step output, initial value and configuration entry is a
//! [`Value`]. Canonicalization is defined once per variant, so anything a
//! step can produce is something the canonicalizer can encode.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

/// A mapping of text keys to values. Keys are unique by construction.
pub type Mapping = BTreeMap<String, Value>;

/// A supported value.
///
/// Serializes to natural JSON: numbers, strings, booleans, arrays, objects.
/// Deserialization goes through `TryFrom<serde_json::Value>`, so stored
/// values obey the same rules as [`from_json_str`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Exact integer.
    Int(i64),
    /// Floating point number. Integral finite floats canonicalize as integers.
    Float(f64),
    Bool(bool),
    Text(String),
    /// Ordered sequence; order is significant.
    Seq(Vec<Value>),
    /// Text-keyed mapping; insertion order is irrelevant.
    Map(Mapping),
}

impl Value {
    /// Build a mapping value from `(key, value)` pairs.
    ///
    /// Later duplicates replace earlier ones.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view as `f64`, for integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Map(m)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = CoreError;

    /// `null` has no canonical form and is rejected, as are integers above
    /// `i64::MAX` (they would silently lose precision as floats).
    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Err(CoreError::UnsupportedType("null".into())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if n.is_u64() {
                    Err(CoreError::UnsupportedType(format!(
                        "integer out of i64 range: {}",
                        n
                    )))
                } else {
                    n.as_f64()
                        .map(Value::Float)
                        .ok_or_else(|| CoreError::UnsupportedType(format!("number: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            serde_json::Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                .collect::<Result<Mapping, _>>()
                .map(Value::Map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::try_from(json).map_err(serde::de::Error::custom)
    }
}

/// Parse a JSON document into a [`Value`].
pub fn from_json_str(s: &str) -> Result<Value, CoreError> {
    let json: serde_json::Value =
        serde_json::from_str(s).map_err(|e| CoreError::UnsupportedType(format!("invalid JSON: {}", e)))?;
    Value::try_from(json)
}

/// Parse a JSON object into a [`Mapping`].
pub fn mapping_from_json_str(s: &str) -> Result<Mapping, CoreError> {
    match from_json_str(s)? {
        Value::Map(m) => Ok(m),
        other => Err(CoreError::UnsupportedType(format!(
            "expected a mapping, got {}",
            other.type_name()
        ))),
    }
}
