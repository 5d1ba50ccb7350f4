//! Search API result types

use super::value::optional_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search filter offered by the server (e.g. `ticket`, `wiki`, `changeset`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub name: String,
    pub description: String,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub href: String,
    pub title: String,
    #[serde(default, with = "optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub author: String,
    pub excerpt: String,
}
