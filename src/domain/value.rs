//! Typed ticket attribute values
//!
//! Trac returns ticket attributes as a loosely typed struct. Instead of
//! passing dynamic values around, every attribute is normalized into an
//! [`AttributeValue`] when it is read from the source system.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a ticket, keyed by attribute name
///
/// A `BTreeMap` keeps the on-disk JSON stable between runs.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single ticket attribute value
///
/// Serialized untagged: integers as JSON numbers, text as strings and absent
/// values as `null`. Timestamps are written as `{"timestamp": "<RFC 3339>"}`
/// so that date-shaped text reads back as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Integer value (all integer widths collapse to i64)
    Integer(i64),
    /// UTC timestamp
    Timestamp(#[serde(with = "tagged_timestamp")] DateTime<Utc>),
    /// Free text
    Text(String),
    /// Attribute present but without a value
    Absent,
}

impl AttributeValue {
    /// Returns the text content for `Text` values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the integer content for `Integer` values
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the timestamp content for `Timestamp` values
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AttributeValue::Absent)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

/// Formats a timestamp the way every store record writes it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a store timestamp
///
/// Accepts RFC 3339 as well as the timezone-less `YYYY-MM-DDTHH:MM:SS`
/// form, which is interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde adapter for the object form of [`AttributeValue::Timestamp`]
mod tagged_timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Tagged {
        timestamp: String,
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Tagged {
            timestamp: format_timestamp(value),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tagged = Tagged::deserialize(deserializer)?;
        parse_timestamp(&tagged.timestamp).ok_or_else(|| {
            de::Error::custom(format!("invalid timestamp '{}'", tagged.timestamp))
        })
    }
}

/// Serde adapter for optional timestamps in store records
///
/// Absent values are written as `null`; both `null` and `""` read back as
/// `None`.
pub mod optional_timestamp {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{s}'"))),
        }
    }
}
