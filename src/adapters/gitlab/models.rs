//! GitLab API models
//!
//! Request and response bodies of the GitLab REST API v4. These are kept
//! separate from the domain model; the sync engine maps between the two.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an issue or milestone
///
/// GitLab reports `opened`/`active` for open entities and `closed` for
/// closed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LifecycleState {
    Open,
    Closed,
}

impl From<String> for LifecycleState {
    fn from(state: String) -> Self {
        if state == "closed" {
            LifecycleState::Closed
        } else {
            LifecycleState::Open
        }
    }
}

impl LifecycleState {
    pub fn from_closed(closed: bool) -> Self {
        if closed {
            LifecycleState::Closed
        } else {
            LifecycleState::Open
        }
    }

    pub fn is_closed(self) -> bool {
        self == LifecycleState::Closed
    }
}

/// Target project
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path_with_namespace: String,
    #[serde(default)]
    pub web_url: String,
}

/// `GET /version`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    /// Only visible to administrators
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub public_email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// True if either the private or the public address matches
    pub fn has_email(&self, email: &str) -> bool {
        [&self.email, &self.public_email]
            .into_iter()
            .flatten()
            .any(|e| e.eq_ignore_ascii_case(email))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: LifecycleState,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
    pub id: u64,
    /// Project-scoped number; equals the Trac ticket id for migrated issues
    pub iid: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: LifecycleState,
    #[serde(default)]
    pub milestone: Option<Milestone>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_url: String,
}

impl Issue {
    pub fn milestone_id(&self) -> Option<u64> {
        self.milestone.as_ref().map(|m| m.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStateEvent {
    Close,
    Reopen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStateEvent {
    Close,
    Activate,
}

/// `POST /projects/:id/issues`
///
/// GitLab does not accept a state on creation; closing is a separate update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIssue {
    pub iid: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

/// `PUT /projects/:id/issues/:iid`; only set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(0)` removes the milestone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<IssueStateEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UpdateIssue {
    pub fn close() -> Self {
        Self {
            state_event: Some(IssueStateEvent::Close),
            ..Self::default()
        }
    }

    /// True when no field would change; `updated_at` alone is not a change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.milestone_id.is_none()
            && self.state_event.is_none()
    }
}

/// `POST /projects/:id/milestones`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMilestone {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// `PUT /projects/:id/milestones/:milestone_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateMilestone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<MilestoneStateEvent>,
}

impl UpdateMilestone {
    pub fn close() -> Self {
        Self {
            state_event: Some(MilestoneStateEvent::Close),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.due_date.is_none() && self.state_event.is_none()
    }
}

/// `POST /users`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub force_random_password: bool,
    pub skip_confirmation: bool,
}

impl CreateUser {
    /// Derives username and display name from the local part of `email`
    pub fn from_email(email: &str) -> Self {
        let local = email.split('@').next().unwrap_or(email);
        Self {
            username: local.to_string(),
            name: local.to_string(),
            email: email.to_lowercase(),
            force_random_password: true,
            skip_confirmation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImpersonationToken {
    pub id: u64,
    pub name: String,
    /// Only present in the creation response
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// `POST /users/:id/impersonation_tokens`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateImpersonationToken {
    pub name: String,
    pub scopes: Vec<String>,
    pub expires_at: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_state_from_api_strings() {
        let issue: Issue = serde_json::from_str(
            r#"{"id":1,"iid":42,"title":"t","state":"opened","milestone":null}"#,
        )
        .unwrap();
        assert_eq!(issue.state, LifecycleState::Open);

        let milestone: Milestone = serde_json::from_str(
            r#"{"id":3,"title":"v1","state":"closed","due_date":"2025-07-24"}"#,
        )
        .unwrap();
        assert!(milestone.state.is_closed());
        assert_eq!(milestone.due_date, NaiveDate::from_ymd_opt(2025, 7, 24));
    }

    #[test]
    fn test_update_issue_serializes_only_set_fields() {
        let update = UpdateIssue::close();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"state_event": "close"})
        );
    }

    #[test]
    fn test_update_issue_timestamp_alone_is_empty() {
        let update = UpdateIssue {
            updated_at: Some(Utc::now()),
            ..UpdateIssue::default()
        };
        assert!(update.is_empty());
    }

    #[test]
    fn test_create_user_from_email() {
        let user = CreateUser::from_email("Jane.Doe@Example.org");
        assert_eq!(user.username, "Jane.Doe");
        assert_eq!(user.email, "jane.doe@example.org");
        assert!(user.force_random_password);
    }

    #[test]
    fn test_user_email_match_is_case_insensitive() {
        let user: User = serde_json::from_str(
            r#"{"id":7,"username":"jane","public_email":"Jane@example.org"}"#,
        )
        .unwrap();
        assert!(user.has_email("jane@EXAMPLE.org"));
        assert!(!user.has_email("john@example.org"));
    }
}
