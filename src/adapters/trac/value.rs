//! Decoded XML-RPC values

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A value as carried by XML-RPC
///
/// All integer widths (`i4`, `int`, `i8`) decode to [`RpcValue::Int`].
#[derive(Debug, Clone, PartialEq)]
pub enum RpcValue {
    Int(i64),
    Boolean(bool),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Base64(Vec<u8>),
    Array(Vec<RpcValue>),
    Struct(BTreeMap<String, RpcValue>),
    Nil,
}

impl RpcValue {
    /// Short name of the variant, used in decode error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RpcValue::Int(_) => "int",
            RpcValue::Boolean(_) => "boolean",
            RpcValue::Double(_) => "double",
            RpcValue::String(_) => "string",
            RpcValue::DateTime(_) => "dateTime.iso8601",
            RpcValue::Base64(_) => "base64",
            RpcValue::Array(_) => "array",
            RpcValue::Struct(_) => "struct",
            RpcValue::Nil => "nil",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RpcValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RpcValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean value; integers are accepted as flags
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RpcValue::Boolean(b) => Some(*b),
            RpcValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RpcValue]> {
        match self {
            RpcValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, RpcValue>> {
        match self {
            RpcValue::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Raw bytes of a `base64` value; plain strings are accepted as UTF-8 bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RpcValue::Base64(bytes) => Some(bytes),
            RpcValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

impl fmt::Display for RpcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcValue::Int(i) => write!(f, "{i}"),
            RpcValue::Boolean(b) => write!(f, "{b}"),
            RpcValue::Double(d) => write!(f, "{d}"),
            RpcValue::String(s) => write!(f, "{s:?}"),
            RpcValue::DateTime(ts) => write!(f, "{}", ts.to_rfc3339()),
            RpcValue::Base64(bytes) => write!(f, "<{} bytes>", bytes.len()),
            RpcValue::Array(items) => write!(f, "<array of {}>", items.len()),
            RpcValue::Struct(members) => write!(f, "<struct of {}>", members.len()),
            RpcValue::Nil => write!(f, "nil"),
        }
    }
}

impl From<i64> for RpcValue {
    fn from(i: i64) -> Self {
        RpcValue::Int(i)
    }
}

impl From<i32> for RpcValue {
    fn from(i: i32) -> Self {
        RpcValue::Int(i64::from(i))
    }
}

impl From<bool> for RpcValue {
    fn from(b: bool) -> Self {
        RpcValue::Boolean(b)
    }
}

impl From<&str> for RpcValue {
    fn from(s: &str) -> Self {
        RpcValue::String(s.to_string())
    }
}

impl From<String> for RpcValue {
    fn from(s: String) -> Self {
        RpcValue::String(s)
    }
}

impl From<DateTime<Utc>> for RpcValue {
    fn from(ts: DateTime<Utc>) -> Self {
        RpcValue::DateTime(ts)
    }
}

impl From<Vec<RpcValue>> for RpcValue {
    fn from(items: Vec<RpcValue>) -> Self {
        RpcValue::Array(items)
    }
}

impl From<BTreeMap<String, RpcValue>> for RpcValue {
    fn from(members: BTreeMap<String, RpcValue>) -> Self {
        RpcValue::Struct(members)
    }
}
