//! Attribute values exchanged between models.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name → value map used for declared attributes, step inputs and outputs.
///
/// Ordered so that iteration (and everything derived from it) is deterministic.
pub type AttrMap = BTreeMap<String, Value>;

/// A dynamically typed attribute value.
///
/// Deserializes untagged, so scenario files can write plain YAML scalars and
/// sequences. `Null` means "no value".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
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
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_view_widens_ints() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn yaml_scalars_map_to_variants() {
        let v: Value = serde_yaml::from_str("1").unwrap();
        assert_eq!(v, Value::Int(1));
        let v: Value = serde_yaml::from_str("1.5").unwrap();
        assert_eq!(v, Value::Float(1.5));
        let v: Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(v, Value::Bool(true));
        let v: Value = serde_yaml::from_str("~").unwrap();
        assert_eq!(v, Value::Null);
        let v: Value = serde_yaml::from_str("[1, 2.5, a]").unwrap();
        assert_eq!(
            v,
            Value::List(vec![Value::Int(1), Value::Float(2.5), Value::Text("a".into())])
        );
    }

    #[test]
    fn display_lists() {
        let v = Value::from(vec![1.0, 2.0]);
        assert_eq!(v.to_string(), "[1, 2]");
        assert_eq!(Value::Null.to_string(), "");
    }
}
