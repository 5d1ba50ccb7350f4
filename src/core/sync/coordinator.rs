//! Import coordinator
//!
//! Reads the intermediate store and reconciles it against one GitLab
//! project: milestones first, so issues can link to them, then issues.

use super::issues::IssueSync;
use super::milestones::MilestoneSync;
use super::summary::{EntityKind, ImportSummary};
use crate::adapters::gitlab::{GitLabApi, UserSessionCache};
use crate::config::ImportConfig;
use crate::core::store::{read_files_from_dir, StoreLayout};
use crate::domain::{Milestone, Result, Ticket};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

pub struct SyncCoordinator {
    config: ImportConfig,
    api: Arc<dyn GitLabApi>,
    layout: StoreLayout,
    shutdown_signal: Option<watch::Receiver<bool>>,
}

impl SyncCoordinator {
    pub fn new(config: ImportConfig, api: Arc<dyn GitLabApi>, layout: StoreLayout) -> Self {
        Self {
            config,
            api,
            layout,
            shutdown_signal: None,
        }
    }

    /// Stop between phases once `signal` turns true
    pub fn with_shutdown_signal(mut self, signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    fn shutdown_requested(&self, summary: &mut ImportSummary) -> bool {
        let requested = self
            .shutdown_signal
            .as_ref()
            .map(|signal| *signal.borrow())
            .unwrap_or(false);
        if requested {
            summary.interrupted = true;
        }
        requested
    }

    /// Execute the import
    ///
    /// # Errors
    ///
    /// Fails when the project cannot be resolved or a target listing call
    /// fails. Entity-level failures are recorded in the summary.
    pub async fn execute_import(&self) -> Result<ImportSummary> {
        let start_time = Instant::now();
        let mut summary = ImportSummary::new(self.config.dry_run);

        let project = self.api.get_project().await?;
        tracing::info!(
            project = %project.path_with_namespace,
            project_id = project.id,
            dry_run = self.config.dry_run,
            "Starting import"
        );

        if self.config.import_milestones && !self.shutdown_requested(&mut summary) {
            let milestones: Vec<Milestone> =
                self.load_records(&self.layout.milestones_dir(), EntityKind::Milestone, &mut summary)?;
            MilestoneSync::new(self.api.as_ref(), self.config.dry_run)
                .sync_all(&milestones, &mut summary)
                .await?;
        }

        if self.config.import_issues && !self.shutdown_requested(&mut summary) {
            let tickets: Vec<Ticket> =
                self.load_records(&self.layout.tickets_dir(), EntityKind::Issue, &mut summary)?;
            let targets = self.api.list_milestones().await?;

            let sessions = self.config.impersonate_users.then(|| {
                UserSessionCache::new(
                    self.config.impersonation_token_name.clone(),
                    self.config.create_users,
                )
            });

            let mut issues = IssueSync::new(self.api.as_ref(), self.config.dry_run);
            if let Some(sessions) = &sessions {
                issues = issues.with_sessions(sessions);
            }
            issues.sync_all(&tickets, &targets, &mut summary).await;

            if let Some(sessions) = &sessions {
                summary.tokens_revoked = sessions.revoke_all(self.api.as_ref()).await;
            }
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Reads and decodes every record of one store directory
    ///
    /// A missing directory reads as empty; undecodable files are recorded as
    /// failures of `kind`.
    fn load_records<T: DeserializeOwned>(
        &self,
        dir: &Path,
        kind: EntityKind,
        summary: &mut ImportSummary,
    ) -> Result<Vec<T>> {
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "Store directory missing; nothing to import");
            return Ok(Vec::new());
        }

        let files = read_files_from_dir(dir, ".json", self.config.max_files)?;
        let mut records = Vec::with_capacity(files.len());
        for file in files {
            match file.parse_json::<T>() {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!(path = %file.path.display(), error = %error, "Skipping unreadable record");
                    summary.record_failure(kind, file.path.display().to_string(), &error);
                }
            }
        }
        Ok(records)
    }
}
