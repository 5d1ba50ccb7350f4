//! Import summary and reporting

use crate::domain::MigrationError;
use std::fmt;
use std::time::Duration;

/// Kind of entity being synchronized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Milestone,
    Issue,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Milestone => write!(f, "milestone"),
            EntityKind::Issue => write!(f, "issue"),
        }
    }
}

/// What happened to one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

/// Counters for one entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl EntityCounts {
    pub fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Created => self.created += 1,
            SyncAction::Updated => self.updated += 1,
            SyncAction::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failed
    }
}

/// An entity that could not be synchronized
#[derive(Debug, Clone)]
pub struct ImportError {
    pub kind: EntityKind,
    /// Ticket id, milestone title or store path
    pub key: String,
    pub message: String,
    pub connection: bool,
}

/// Summary of an import run
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub milestones: EntityCounts,
    pub issues: EntityCounts,

    /// Planned changes were logged but not sent
    pub dry_run: bool,

    /// Set when a shutdown signal stopped the run early
    pub interrupted: bool,

    /// Impersonation tokens revoked at the end of the run
    pub tokens_revoked: usize,

    pub duration: Duration,
    pub errors: Vec<ImportError>,
}

impl ImportSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn counts_mut(&mut self, kind: EntityKind) -> &mut EntityCounts {
        match kind {
            EntityKind::Milestone => &mut self.milestones,
            EntityKind::Issue => &mut self.issues,
        }
    }

    pub fn record(&mut self, kind: EntityKind, action: SyncAction) {
        self.counts_mut(kind).record(action);
    }

    /// Counts the entity as failed and keeps the error
    pub fn record_failure(&mut self, kind: EntityKind, key: impl Into<String>, error: &MigrationError) {
        self.counts_mut(kind).failed += 1;
        self.errors.push(ImportError {
            kind,
            key: key.into(),
            message: error.to_string(),
            connection: error.is_connection_error(),
        });
    }

    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && !self.interrupted
    }

    pub fn has_connection_errors(&self) -> bool {
        self.errors.iter().any(|e| e.connection)
    }

    /// Requests sent (or planned, in dry-run mode) to GitLab
    pub fn changes(&self) -> usize {
        self.milestones.created + self.milestones.updated + self.issues.created + self.issues.updated
    }

    pub fn log_summary(&self) {
        tracing::info!(
            dry_run = self.dry_run,
            milestones_created = self.milestones.created,
            milestones_updated = self.milestones.updated,
            milestones_unchanged = self.milestones.unchanged,
            milestones_failed = self.milestones.failed,
            issues_created = self.issues.created,
            issues_updated = self.issues.updated,
            issues_unchanged = self.issues.unchanged,
            issues_failed = self.issues.failed,
            tokens_revoked = self.tokens_revoked,
            duration_secs = self.duration.as_secs(),
            "Import completed"
        );

        if self.interrupted {
            tracing::warn!("Import interrupted by shutdown signal");
        }

        for error in &self.errors {
            tracing::warn!(
                kind = %error.kind,
                key = %error.key,
                message = %error.message,
                "Import error"
            );
        }
    }
}
