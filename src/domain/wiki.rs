//! Wiki page domain model

use super::value::optional_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of one wiki page version
///
/// Written next to the page content as `<page>.v<N>.json`. For the current
/// version, `version` is also the number of versions the page has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiPageInfo {
    pub name: String,
    pub version: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default, with = "optional_timestamp")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Immutable snapshot of a page at one version
#[derive(Debug, Clone, PartialEq)]
pub struct WikiPageVersion {
    pub info: WikiPageInfo,
    /// Markdown content; `None` when the server returned no text
    pub content: Option<String>,
}
