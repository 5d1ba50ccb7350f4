//! Milestone synchronization
//!
//! Milestones are matched to GitLab by exact title. Missing ones are
//! created (and closed right after when completed); existing ones receive
//! only the fields that differ.

use super::plan::{find_milestone, plan_milestone_create, plan_milestone_update};
use super::summary::{EntityKind, ImportSummary, SyncAction};
use crate::adapters::gitlab::{GitLabApi, Milestone as TargetMilestone, UpdateMilestone};
use crate::domain::{Milestone, Result};
use crate::log_record_skipped;

pub struct MilestoneSync<'a> {
    api: &'a dyn GitLabApi,
    dry_run: bool,
}

impl<'a> MilestoneSync<'a> {
    pub fn new(api: &'a dyn GitLabApi, dry_run: bool) -> Self {
        Self { api, dry_run }
    }

    /// Reconciles every exported milestone against the project
    ///
    /// # Errors
    ///
    /// Only if the target milestone list cannot be fetched. Per-milestone
    /// failures are recorded in `summary` and the rest continue.
    pub async fn sync_all(&self, sources: &[Milestone], summary: &mut ImportSummary) -> Result<()> {
        let mut targets = self.api.list_milestones().await?;
        tracing::debug!(
            exported = sources.len(),
            existing = targets.len(),
            "Synchronizing milestones"
        );

        for source in sources {
            match self.sync_one(source, &mut targets).await {
                Ok(action) => summary.record(EntityKind::Milestone, action),
                Err(e) => {
                    let error = e.with_key(format!("milestone {}", source.name));
                    log_record_skipped!("milestone", source.name, error);
                    summary.record_failure(EntityKind::Milestone, source.name.clone(), &error);
                }
            }
        }
        Ok(())
    }

    /// Creates or updates one milestone
    ///
    /// A created milestone is appended to `targets` so later duplicates
    /// resolve to it.
    pub async fn sync_one(
        &self,
        source: &Milestone,
        targets: &mut Vec<TargetMilestone>,
    ) -> Result<SyncAction> {
        let Some(existing) = find_milestone(&source.name, targets) else {
            return self.create(source, targets).await;
        };

        let update = plan_milestone_update(source, existing);
        if update.is_empty() {
            tracing::debug!(title = %source.name, "Milestone up to date");
            return Ok(SyncAction::Unchanged);
        }

        if self.dry_run {
            tracing::info!(title = %source.name, ?update, "Dry run: would update milestone");
            return Ok(SyncAction::Updated);
        }

        let id = existing.id;
        let updated = self.api.update_milestone(id, &update).await?;
        tracing::info!(title = %source.name, id, "Milestone updated");
        if let Some(slot) = targets.iter_mut().find(|m| m.id == id) {
            *slot = updated;
        }
        Ok(SyncAction::Updated)
    }

    async fn create(
        &self,
        source: &Milestone,
        targets: &mut Vec<TargetMilestone>,
    ) -> Result<SyncAction> {
        let (create, close) = plan_milestone_create(source);

        if self.dry_run {
            tracing::info!(title = %source.name, close, "Dry run: would create milestone");
            return Ok(SyncAction::Created);
        }

        let mut created = self.api.create_milestone(&create).await?;
        tracing::info!(title = %created.title, id = created.id, "Milestone created");

        if close {
            created = self
                .api
                .update_milestone(created.id, &UpdateMilestone::close())
                .await?;
            tracing::info!(title = %created.title, id = created.id, "Milestone closed");
        }

        targets.push(created);
        Ok(SyncAction::Created)
    }
}
