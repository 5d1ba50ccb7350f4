//! Milestone domain model

use super::value::optional_timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Exported Trac milestone
///
/// The title (`name`) is the natural key matched against GitLab milestones.
/// A milestone with a completed date is considered closed.
///
/// ```
/// use trac2gitlab::domain::Milestone;
///
/// let m: Milestone = serde_json::from_str(
///     r#"{"name":"v1","due_date":"2025-07-24T16:00:00Z","completed_date":""}"#,
/// ).unwrap();
/// assert!(!m.is_completed());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "optional_timestamp")]
    pub completed_date: Option<DateTime<Utc>>,
}

impl Milestone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            due_date: None,
            completed_date: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_date.is_some()
    }

    /// Due date truncated to the calendar day (UTC)
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(|ts| ts.date_naive())
    }

    /// Description, `None` when unset or empty
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_due_day_truncates_time() {
        let mut m = Milestone::new("v1");
        m.due_date = Some(Utc.with_ymd_and_hms(2025, 7, 24, 16, 0, 0).unwrap());
        assert_eq!(m.due_day(), NaiveDate::from_ymd_opt(2025, 7, 24));
    }

    #[test]
    fn test_completed() {
        let mut m = Milestone::new("v1");
        assert!(!m.is_completed());
        m.completed_date = Some(Utc::now());
        assert!(m.is_completed());
    }

    #[test]
    fn test_empty_description_is_none() {
        let mut m = Milestone::new("v1");
        m.description = Some(String::new());
        assert_eq!(m.description_text(), None);
    }

    #[test]
    fn test_serialize_absent_dates_as_null() {
        let json = serde_json::to_value(Milestone::new("v2")).unwrap();
        assert_eq!(json["name"], "v2");
        assert!(json["due_date"].is_null());
        assert!(json.get("description").is_none());
    }
}
