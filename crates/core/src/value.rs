//! Bin value model
//!
//! The record store keeps a small, closed set of value types per bin:
//! - Nil (absent bin; writing Nil removes the bin)
//! - Int (64-bit signed integer, the only type arithmetic applies to)
//! - Str (UTF-8 text)
//! - List (ordered sequence, native list operations)
//! - Map (string-keyed nested map, native map operations)
//!
//! There are no implicit coercions: `Int(12) != Str("12")`. Mapping client
//! byte strings onto this model is the codec's job, not this module's.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bins of one record, keyed by bin name
pub type BinMap = BTreeMap<String, Value>;

/// Value held by one bin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absent value
    #[default]
    Nil,
    /// 64-bit signed integer
    Int(i64),
    /// UTF-8 text
    Str(String),
    /// Ordered list
    List(Vec<Value>),
    /// Nested map with text keys
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Int(_) => "Int",
            Value::Str(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Check if this is the absent value
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a Str value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is a List value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as map if this is a Map value
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Approximate stored size in bytes
    ///
    /// Used by record-size limit enforcement. Integers count as 8 bytes,
    /// text by its UTF-8 length, containers recursively plus map keys.
    pub fn estimated_size(&self) -> usize {
        match self {
            Value::Nil => 0,
            Value::Int(_) => 8,
            Value::Str(s) => s.len(),
            Value::List(l) => l.iter().map(Value::estimated_size).sum(),
            Value::Map(m) => m.iter().map(|(k, v)| k.len() + v.estimated_size()).sum(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => f.write_str(s),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}
