//! Normalization of loosely typed source values
//!
//! Trac reports times inconsistently: epoch seconds, timezone-less ISO
//! strings or XML-RPC `dateTime.iso8601` values depending on the field and
//! plugin version. These helpers turn all of them into `DateTime<Utc>`.

use crate::adapters::trac::RpcValue;
use crate::domain::{AttributeValue, MigrationError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Layout of timezone-less time strings reported by Trac
pub const TRAC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Normalizes a time value
///
/// - integer: Unix epoch seconds, `0` means absent
/// - string: `YYYY-MM-DDTHH:MM:SS` read as UTC, `""` means absent
/// - `dateTime.iso8601`: passed through
///
/// # Errors
///
/// [`MigrationError::InvalidValue`] for any other shape or an unparseable string.
pub fn normalize_time(value: &RpcValue) -> Result<Option<DateTime<Utc>>> {
    match value {
        RpcValue::Int(0) => Ok(None),
        RpcValue::Int(secs) => DateTime::from_timestamp(*secs, 0).map(Some).ok_or_else(|| {
            MigrationError::InvalidValue(format!("epoch seconds {secs} out of range"))
        }),
        RpcValue::String(s) if s.is_empty() => Ok(None),
        RpcValue::String(s) => NaiveDateTime::parse_from_str(s, TRAC_TIME_FORMAT)
            .map(|naive| Some(naive.and_utc()))
            .map_err(|e| MigrationError::InvalidValue(format!("unparseable time {s:?}: {e}"))),
        RpcValue::DateTime(ts) => Ok(Some(*ts)),
        other => Err(MigrationError::InvalidValue(format!(
            "expected a time value, got {}",
            other.type_name()
        ))),
    }
}

/// Like [`normalize_time`], but an absent result is an error too
pub fn normalize_required_time(value: &RpcValue, field: &str) -> Result<DateTime<Utc>> {
    normalize_time(value)?
        .ok_or_else(|| MigrationError::InvalidValue(format!("{field} is required but absent")))
}

/// Coerces numeric values to i64
///
/// Floats are truncated toward zero. Anything else yields `None`.
pub fn normalize_int(value: &RpcValue) -> Option<i64> {
    match value {
        RpcValue::Int(i) => Some(*i),
        RpcValue::Double(d) if d.is_finite() => Some(d.trunc() as i64),
        _ => None,
    }
}

/// Maps a decoded scalar to a typed ticket attribute
///
/// Structured values (arrays, structs, binary) have no attribute form and
/// yield `None`.
pub fn to_attribute_value(value: &RpcValue) -> Option<AttributeValue> {
    match value {
        RpcValue::String(s) => Some(AttributeValue::Text(s.clone())),
        RpcValue::Int(_) | RpcValue::Double(_) => normalize_int(value).map(AttributeValue::Integer),
        RpcValue::Boolean(b) => Some(AttributeValue::Integer(i64::from(*b))),
        RpcValue::DateTime(ts) => Some(AttributeValue::Timestamp(*ts)),
        RpcValue::Nil => Some(AttributeValue::Absent),
        RpcValue::Base64(_) | RpcValue::Array(_) | RpcValue::Struct(_) => None,
    }
}
