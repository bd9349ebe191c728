use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar identifier records are indexed by.
///
/// Integer keys sort before string keys, which fixes the iteration order of a
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Int(i64),
    Str(String),
}

impl PrimaryKey {
    /// Read a key out of a JSON value. Only strings and integers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(PrimaryKey::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(PrimaryKey::Int),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PrimaryKey::Int(n) => Value::from(*n),
            PrimaryKey::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(n) => write!(f, "{}", n),
            PrimaryKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        PrimaryKey::Str(value)
    }
}

impl From<&String> for PrimaryKey {
    fn from(value: &String) -> Self {
        PrimaryKey::Str(value.clone())
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::Str(value.to_string())
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        PrimaryKey::Int(value)
    }
}

impl From<i32> for PrimaryKey {
    fn from(value: i32) -> Self {
        PrimaryKey::Int(value.into())
    }
}

impl From<u32> for PrimaryKey {
    fn from(value: u32) -> Self {
        PrimaryKey::Int(value.into())
    }
}
