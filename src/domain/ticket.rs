//! Ticket domain model
//!
//! A [`Ticket`] is a read-only snapshot of a Trac ticket as it was exported:
//! its attributes, attachment metadata and the two kinds of change-log
//! entries the migration keeps (description revisions and comments).

use super::value::{optional_timestamp, AttributeValue, Attributes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Change-log field name of description edits
pub const DESCRIPTION_FIELD: &str = "description";

/// Change-log field name of comments
pub const COMMENT_FIELD: &str = "comment";

/// Ticket status value that maps to a closed target issue
pub const CLOSED_STATUS: &str = "closed";

/// Exported Trac ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Trac ticket number, reused as the GitLab issue IID
    pub id: i64,

    #[serde(default, with = "optional_timestamp")]
    pub time_created: Option<DateTime<Utc>>,

    #[serde(default, with = "optional_timestamp")]
    pub time_changed: Option<DateTime<Utc>>,

    /// Ticket attributes; always contains `description` once loaded
    pub attributes: Attributes,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Description revisions, oldest first
    #[serde(default)]
    pub description_history: Vec<ChangeLogEntry>,

    /// Comments, oldest first
    #[serde(default)]
    pub comments: Vec<ChangeLogEntry>,
}

impl Ticket {
    /// Creates a ticket with the given attributes and no history
    ///
    /// A missing `description` attribute is inserted as empty text.
    pub fn new(id: i64, mut attributes: Attributes) -> Self {
        attributes
            .entry(DESCRIPTION_FIELD.to_string())
            .or_insert_with(|| AttributeValue::Text(String::new()));
        Self {
            id,
            time_created: None,
            time_changed: None,
            attributes,
            attachments: Vec::new(),
            description_history: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Text value of an attribute, or `""` when missing or not text
    pub fn text(&self, key: &str) -> &str {
        self.attributes
            .get(key)
            .and_then(AttributeValue::as_text)
            .unwrap_or("")
    }

    pub fn summary(&self) -> &str {
        self.text("summary")
    }

    pub fn description(&self) -> &str {
        self.text(DESCRIPTION_FIELD)
    }

    pub fn status(&self) -> &str {
        self.text("status")
    }

    pub fn reporter(&self) -> &str {
        self.text("reporter")
    }

    pub fn owner(&self) -> &str {
        self.text("owner")
    }

    /// Milestone title, `None` when unset or blank
    pub fn milestone(&self) -> Option<&str> {
        let name = self.text("milestone").trim();
        (!name.is_empty()).then_some(name)
    }

    pub fn is_closed(&self) -> bool {
        self.status() == CLOSED_STATUS
    }
}

/// Attachment metadata
///
/// The filename identifies the attachment within its owning ticket or wiki
/// page. Content is fetched separately and written next to the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, with = "optional_timestamp")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: String,
}

/// One entry of a ticket change log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    #[serde(default, with = "optional_timestamp")]
    pub time: Option<DateTime<Utc>>,
    pub author: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(default)]
    pub permanent: bool,
}

/// Change log split into the two categories the migration keeps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketHistory {
    pub description_history: Vec<ChangeLogEntry>,
    pub comments: Vec<ChangeLogEntry>,
}

impl TicketHistory {
    /// Partitions raw change-log entries by field
    ///
    /// Entries for any other field are dropped.
    pub fn partition(entries: impl IntoIterator<Item = ChangeLogEntry>) -> Self {
        let mut history = Self::default();
        for entry in entries {
            match entry.field.as_str() {
                DESCRIPTION_FIELD => history.description_history.push(entry),
                COMMENT_FIELD => history.comments.push(entry),
                other => tracing::trace!(field = other, "Dropping change-log entry"),
            }
        }
        history
    }
}

/// Custom or built-in ticket field with its selectable options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(field: &str, new_value: &str) -> ChangeLogEntry {
        ChangeLogEntry {
            time: None,
            author: "alice".to_string(),
            field: field.to_string(),
            old_value: None,
            new_value: Some(new_value.to_string()),
            permanent: true,
        }
    }

    #[test]
    fn test_new_inserts_description() {
        let ticket = Ticket::new(1, Attributes::new());
        assert_eq!(ticket.description(), "");
        assert!(ticket.attributes.contains_key(DESCRIPTION_FIELD));
    }

    #[test]
    fn test_new_keeps_existing_description() {
        let mut attrs = Attributes::new();
        attrs.insert("description".to_string(), "body".into());
        let ticket = Ticket::new(1, attrs);
        assert_eq!(ticket.description(), "body");
    }

    #[test]
    fn test_milestone_blank_is_none() {
        let mut attrs = Attributes::new();
        attrs.insert("milestone".to_string(), "  ".into());
        assert_eq!(Ticket::new(1, attrs).milestone(), None);

        let mut attrs = Attributes::new();
        attrs.insert("milestone".to_string(), "v1".into());
        assert_eq!(Ticket::new(1, attrs).milestone(), Some("v1"));
    }

    #[test]
    fn test_is_closed() {
        let mut attrs = Attributes::new();
        attrs.insert("status".to_string(), "closed".into());
        assert!(Ticket::new(42, attrs).is_closed());

        let mut attrs = Attributes::new();
        attrs.insert("status".to_string(), "reopened".into());
        assert!(!Ticket::new(42, attrs).is_closed());
    }

    #[test]
    fn test_partition_changelog() {
        let history = TicketHistory::partition(vec![
            entry("comment", "first"),
            entry("status", "closed"),
            entry("description", "v2"),
            entry("comment", "second"),
            entry("owner", "bob"),
        ]);

        assert_eq!(history.comments.len(), 2);
        assert_eq!(history.description_history.len(), 1);
        assert_eq!(history.comments[1].new_value.as_deref(), Some("second"));
    }

    #[test]
    fn test_ticket_json_roundtrip_keeps_history() {
        let mut ticket = Ticket::new(9, Attributes::new());
        ticket.comments.push(entry("comment", "hello"));
        let json = serde_json::to_string(&ticket).unwrap();
        let back: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ticket);
    }

    #[test]
    fn test_ticket_json_roundtrip_keeps_date_shaped_summary() {
        let mut attrs = Attributes::new();
        attrs.insert("summary".to_string(), "2025-07-24T16:00:00Z".into());
        let ticket = Ticket::new(7, attrs);

        let json = serde_json::to_string(&ticket).unwrap();
        let back: Ticket = serde_json::from_str(&json).unwrap();

        assert_eq!(back.summary(), "2025-07-24T16:00:00Z");
        assert_eq!(back, ticket);
    }
}
