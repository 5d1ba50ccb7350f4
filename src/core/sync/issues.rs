//! Issue synchronization
//!
//! Each exported ticket maps to the GitLab issue with the same IID. A missing
//! issue is created (closed right after when the ticket is closed); an
//! existing one receives only the fields that differ, with open/closed
//! differences sent as state events.

use super::plan::{plan_issue_create, plan_issue_update, resolve_milestone_id};
use super::summary::{EntityKind, ImportSummary, SyncAction};
use crate::adapters::gitlab::{
    GitLabApi, Milestone as TargetMilestone, UpdateIssue, UserSessionCache,
};
use crate::domain::{Result, Ticket};
use crate::log_record_skipped;
use std::sync::Arc;

pub struct IssueSync<'a> {
    api: &'a dyn GitLabApi,
    sessions: Option<&'a UserSessionCache>,
    dry_run: bool,
}

impl<'a> IssueSync<'a> {
    pub fn new(api: &'a dyn GitLabApi, dry_run: bool) -> Self {
        Self {
            api,
            sessions: None,
            dry_run,
        }
    }

    /// Create new issues as their reporter through `sessions`
    pub fn with_sessions(mut self, sessions: &'a UserSessionCache) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Reconciles every ticket; failures are recorded and the rest continue
    pub async fn sync_all(
        &self,
        tickets: &[Ticket],
        milestones: &[TargetMilestone],
        summary: &mut ImportSummary,
    ) {
        tracing::debug!(tickets = tickets.len(), "Synchronizing issues");
        for ticket in tickets {
            match self.sync_one(ticket, milestones).await {
                Ok(action) => summary.record(EntityKind::Issue, action),
                Err(e) => {
                    let error = e.with_key(format!("ticket {}", ticket.id));
                    log_record_skipped!("issue", ticket.id, error);
                    summary.record_failure(EntityKind::Issue, ticket.id.to_string(), &error);
                }
            }
        }
    }

    /// Creates or updates the issue for one ticket
    pub async fn sync_one(
        &self,
        ticket: &Ticket,
        milestones: &[TargetMilestone],
    ) -> Result<SyncAction> {
        let milestone_id = resolve_milestone_id(ticket.milestone(), milestones);
        if let (Some(title), None) = (ticket.milestone(), milestone_id) {
            tracing::debug!(
                ticket_id = ticket.id,
                milestone = title,
                "Milestone not found in project; issue gets none"
            );
        }

        let Some(issue) = self.api.get_issue(ticket.id).await? else {
            return self.create(ticket, milestone_id).await;
        };

        let update = plan_issue_update(ticket, &issue, milestone_id);
        if update.is_empty() {
            tracing::debug!(iid = ticket.id, "Issue up to date");
            return Ok(SyncAction::Unchanged);
        }

        if self.dry_run {
            tracing::info!(iid = ticket.id, ?update, "Dry run: would update issue");
            return Ok(SyncAction::Updated);
        }

        self.api.update_issue(ticket.id, &update).await?;
        tracing::info!(iid = ticket.id, state_event = ?update.state_event, "Issue updated");
        Ok(SyncAction::Updated)
    }

    async fn create(&self, ticket: &Ticket, milestone_id: Option<u64>) -> Result<SyncAction> {
        let (create, close) = plan_issue_create(ticket, milestone_id);

        if self.dry_run {
            tracing::info!(iid = ticket.id, close, "Dry run: would create issue");
            return Ok(SyncAction::Created);
        }

        let author = self.author_client(ticket).await;
        let client: &dyn GitLabApi = match &author {
            Some(client) => client.as_ref(),
            None => self.api,
        };

        let issue = client.create_issue(&create).await?;
        tracing::info!(iid = issue.iid, url = %issue.web_url, "Issue created");

        if close {
            client.update_issue(issue.iid, &UpdateIssue::close()).await?;
            tracing::info!(iid = issue.iid, "Issue closed");
        }
        Ok(SyncAction::Created)
    }

    /// Impersonated client for the ticket's reporter, if impersonation is on
    ///
    /// Falls back to the administrator client when the reporter cannot be
    /// impersonated.
    async fn author_client(&self, ticket: &Ticket) -> Option<Arc<dyn GitLabApi>> {
        let sessions = self.sessions?;
        let reporter = ticket.reporter().trim();
        if reporter.is_empty() {
            return None;
        }

        match sessions.client_for(self.api, reporter).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(
                    iid = ticket.id,
                    reporter,
                    error = %e,
                    "Cannot impersonate reporter; creating issue as administrator"
                );
                None
            }
        }
    }
}
