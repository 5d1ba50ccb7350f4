//! Change planning
//!
//! Pure functions that compare an exported record with the live GitLab
//! entity and produce the smallest request that reconciles them. State is
//! never written directly; open/closed differences become state events.

use crate::adapters::gitlab::{
    CreateIssue, CreateMilestone, Issue, IssueStateEvent, Milestone as TargetMilestone,
    MilestoneStateEvent, UpdateIssue, UpdateMilestone,
};
use crate::domain::{Milestone, Ticket};

/// Target milestone whose title equals `title` exactly
pub fn find_milestone<'a>(
    title: &str,
    targets: &'a [TargetMilestone],
) -> Option<&'a TargetMilestone> {
    targets.iter().find(|m| m.title == title)
}

/// Resolves a ticket's milestone title to a target milestone id
///
/// Unset or unknown titles resolve to no milestone.
pub fn resolve_milestone_id(title: Option<&str>, targets: &[TargetMilestone]) -> Option<u64> {
    title
        .and_then(|t| find_milestone(t, targets))
        .map(|m| m.id)
}

/// Creation request for a milestone missing from the target
///
/// The returned flag says whether a `close` event must follow creation.
pub fn plan_milestone_create(source: &Milestone) -> (CreateMilestone, bool) {
    let create = CreateMilestone {
        title: source.name.clone(),
        description: source.description_text().map(str::to_string),
        due_date: source.due_day(),
    };
    (create, source.is_completed())
}

/// Fields of `target` that differ from `source`
///
/// Description and due date are only compared when the source has one.
/// Due dates compare by calendar day.
pub fn plan_milestone_update(source: &Milestone, target: &TargetMilestone) -> UpdateMilestone {
    let mut update = UpdateMilestone::default();

    if let Some(description) = source.description_text() {
        if target.description.as_deref().unwrap_or("") != description {
            update.description = Some(description.to_string());
        }
    }

    if let Some(day) = source.due_day() {
        if target.due_date != Some(day) {
            update.due_date = Some(day);
        }
    }

    match (source.is_completed(), target.state.is_closed()) {
        (true, false) => update.state_event = Some(MilestoneStateEvent::Close),
        (false, true) => update.state_event = Some(MilestoneStateEvent::Activate),
        _ => {}
    }

    update
}

/// Creation request for a ticket with no issue of the same IID
///
/// The returned flag says whether a `close` event must follow creation.
pub fn plan_issue_create(ticket: &Ticket, milestone_id: Option<u64>) -> (CreateIssue, bool) {
    let description = ticket.description();
    let create = CreateIssue {
        iid: ticket.id,
        title: ticket.summary().trim().to_string(),
        description: (!description.is_empty()).then(|| description.to_string()),
        created_at: ticket.time_created,
        milestone_id,
    };
    (create, ticket.is_closed())
}

/// Fields of `issue` that differ from `ticket`
///
/// An issue linked to a milestone the ticket no longer resolves to is
/// unlinked. `updated_at` is carried only when something else changes.
/// Titles compare trimmed, since GitLab strips surrounding whitespace.
pub fn plan_issue_update(ticket: &Ticket, issue: &Issue, milestone_id: Option<u64>) -> UpdateIssue {
    let mut update = UpdateIssue::default();

    let title = ticket.summary().trim();
    if issue.title != title {
        update.title = Some(title.to_string());
    }

    if issue.description.as_deref().unwrap_or("") != ticket.description() {
        update.description = Some(ticket.description().to_string());
    }

    if issue.milestone_id() != milestone_id {
        update.milestone_id = Some(milestone_id.unwrap_or(0));
    }

    match (ticket.is_closed(), issue.state.is_closed()) {
        (true, false) => update.state_event = Some(IssueStateEvent::Close),
        (false, true) => update.state_event = Some(IssueStateEvent::Reopen),
        _ => {}
    }

    if !update.is_empty() {
        update.updated_at = ticket.time_changed;
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gitlab::LifecycleState;
    use crate::domain::Attributes;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn target_milestone(id: u64, title: &str, closed: bool) -> TargetMilestone {
        TargetMilestone {
            id,
            title: title.to_string(),
            description: None,
            state: LifecycleState::from_closed(closed),
            due_date: None,
        }
    }

    fn ticket(id: i64, summary: &str, status: &str, milestone: &str) -> Ticket {
        let mut attrs = Attributes::new();
        attrs.insert("summary".to_string(), summary.into());
        attrs.insert("status".to_string(), status.into());
        attrs.insert("milestone".to_string(), milestone.into());
        attrs.insert("description".to_string(), "Steps to reproduce".into());
        Ticket::new(id, attrs)
    }

    fn issue_for(ticket: &Ticket, milestone: Option<TargetMilestone>) -> Issue {
        Issue {
            id: 1000 + ticket.id as u64,
            iid: ticket.id,
            title: ticket.summary().trim().to_string(),
            description: Some(ticket.description().to_string()),
            state: LifecycleState::from_closed(ticket.is_closed()),
            milestone,
            updated_at: None,
            web_url: String::new(),
        }
    }

    #[test]
    fn test_resolve_milestone_exact_title() {
        let targets = vec![target_milestone(1, "v1", false), target_milestone(2, "V1.0", false)];

        assert_eq!(resolve_milestone_id(Some("v1"), &targets), Some(1));
        assert_eq!(resolve_milestone_id(Some("V1"), &targets), None);
        assert_eq!(resolve_milestone_id(Some("v1.0"), &targets), None);
        assert_eq!(resolve_milestone_id(None, &targets), None);
    }

    #[test]
    fn test_milestone_create_open_with_due_day() {
        let mut source = Milestone::new("v1");
        source.due_date = Some(Utc.with_ymd_and_hms(2025, 7, 24, 16, 0, 0).unwrap());

        let (create, close) = plan_milestone_create(&source);
        assert_eq!(create.title, "v1");
        assert_eq!(create.due_date, NaiveDate::from_ymd_opt(2025, 7, 24));
        assert_eq!(create.description, None);
        assert!(!close);
    }

    #[test]
    fn test_milestone_create_completed_needs_close() {
        let mut source = Milestone::new("v0.9");
        source.completed_date = Some(Utc::now());
        assert!(plan_milestone_create(&source).1);
    }

    #[test]
    fn test_milestone_update_same_day_is_empty() {
        let mut source = Milestone::new("v1");
        source.due_date = Some(Utc.with_ymd_and_hms(2025, 7, 24, 23, 59, 0).unwrap());
        let mut target = target_milestone(1, "v1", false);
        target.due_date = NaiveDate::from_ymd_opt(2025, 7, 24);

        assert!(plan_milestone_update(&source, &target).is_empty());
    }

    #[test]
    fn test_milestone_update_transitions() {
        let mut completed = Milestone::new("v1");
        completed.completed_date = Some(Utc::now());
        let update = plan_milestone_update(&completed, &target_milestone(1, "v1", false));
        assert_eq!(update.state_event, Some(MilestoneStateEvent::Close));

        let open = Milestone::new("v1");
        let update = plan_milestone_update(&open, &target_milestone(1, "v1", true));
        assert_eq!(update.state_event, Some(MilestoneStateEvent::Activate));
        assert_eq!(update.description, None);
        assert_eq!(update.due_date, None);
    }

    #[test]
    fn test_milestone_update_description_only_when_source_has_one() {
        let mut target = target_milestone(1, "v1", false);
        target.description = Some("target text".to_string());

        assert!(plan_milestone_update(&Milestone::new("v1"), &target).is_empty());

        let mut source = Milestone::new("v1");
        source.description = Some("source text".to_string());
        let update = plan_milestone_update(&source, &target);
        assert_eq!(update.description.as_deref(), Some("source text"));
    }

    #[test]
    fn test_issue_create_closed_ticket() {
        let ticket = ticket(42, "Crash on save", "closed", "");
        let (create, close) = plan_issue_create(&ticket, None);

        assert_eq!(create.iid, 42);
        assert_eq!(create.title, "Crash on save");
        assert_eq!(create.milestone_id, None);
        assert!(close);
    }

    #[test]
    fn test_issue_update_matching_is_empty() {
        let milestone = target_milestone(7, "v1", false);
        let ticket = ticket(5, "Title", "new", "v1");
        let issue = issue_for(&ticket, Some(milestone));

        let update = plan_issue_update(&ticket, &issue, Some(7));
        assert!(update.is_empty());
        assert_eq!(update.updated_at, None);
    }

    #[test]
    fn test_issue_update_close_is_single_event() {
        let open = ticket(5, "Title", "new", "");
        let issue = issue_for(&open, None);
        let closed = ticket(5, "Title", "closed", "");

        let update = plan_issue_update(&closed, &issue, None);
        assert_eq!(update.state_event, Some(IssueStateEvent::Close));
        assert_eq!(update.title, None);
        assert_eq!(update.description, None);
        assert_eq!(update.milestone_id, None);
    }

    #[test]
    fn test_issue_update_reopen() {
        let closed = ticket(5, "Title", "closed", "");
        let issue = issue_for(&closed, None);
        let reopened = ticket(5, "Title", "reopened", "");

        let update = plan_issue_update(&reopened, &issue, None);
        assert_eq!(update.state_event, Some(IssueStateEvent::Reopen));
    }

    #[test]
    fn test_issue_update_diffs_fields() {
        let before = ticket(5, "Old title", "new", "");
        let issue = issue_for(&before, Some(target_milestone(7, "v1", false)));
        let mut after = ticket(5, "New title", "new", "");
        after.time_changed = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());

        let update = plan_issue_update(&after, &issue, None);
        assert_eq!(update.title.as_deref(), Some("New title"));
        assert_eq!(update.milestone_id, Some(0));
        assert_eq!(update.description, None);
        assert_eq!(update.state_event, None);
        assert_eq!(update.updated_at, after.time_changed);
    }

    #[test]
    fn test_issue_title_surrounding_whitespace_is_ignored() {
        let ticket = ticket(5, "  Crash ", "new", "");
        let (create, _) = plan_issue_create(&ticket, None);
        assert_eq!(create.title, "Crash");

        let issue = issue_for(&ticket, None);
        assert_eq!(issue.title, "Crash");
        assert!(plan_issue_update(&ticket, &issue, None).is_empty());
    }
}
