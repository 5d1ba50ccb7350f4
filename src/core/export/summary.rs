//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::domain::{GitLabError, MigrationError, TracError};
use std::time::Duration;

/// Summary of an export run
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Ticket records written
    pub tickets_exported: usize,

    /// Tickets that could not be fetched or written
    pub tickets_failed: usize,

    /// Ticket and wiki attachments written
    pub attachments_exported: usize,

    /// Attachments that could not be downloaded or written
    pub attachments_failed: usize,

    /// Wiki pages whose versions were all processed
    pub wiki_pages_exported: usize,

    /// Wiki page versions written
    pub wiki_versions_exported: usize,

    /// Set when the wiki export stopped at its first page error
    pub wiki_aborted: bool,

    pub milestones_exported: usize,
    pub milestones_failed: usize,

    /// Distinct users written to `users.txt`
    pub users_exported: usize,

    /// Ticket field definitions written to `ticket-fields.json`
    pub ticket_fields_exported: usize,

    /// Set when a shutdown signal stopped the run between phases
    pub interrupted: bool,

    /// Duration of the export
    pub duration: Duration,

    /// Errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Records `error` for the entity identified by `key`
    pub fn record_failure(&mut self, phase: ExportPhase, key: impl Into<String>, error: &MigrationError) {
        self.add_error(ExportError::from_migration_error(error).with_context(phase, key));
    }

    /// True when every record was exported
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && !self.wiki_aborted && !self.interrupted
    }

    /// Records written across all phases
    pub fn total_records(&self) -> usize {
        self.tickets_exported
            + self.attachments_exported
            + self.wiki_versions_exported
            + self.milestones_exported
            + usize::from(self.users_exported > 0)
            + usize::from(self.ticket_fields_exported > 0)
    }

    /// True if any error came from the network layer
    pub fn has_connection_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e.error_type, ExportErrorType::Connection))
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            tickets = self.tickets_exported,
            tickets_failed = self.tickets_failed,
            attachments = self.attachments_exported,
            attachments_failed = self.attachments_failed,
            wiki_pages = self.wiki_pages_exported,
            wiki_versions = self.wiki_versions_exported,
            milestones = self.milestones_exported,
            users = self.users_exported,
            duration_secs = self.duration.as_secs(),
            "Export completed"
        );

        if self.interrupted {
            tracing::warn!("Export interrupted by shutdown signal");
        }

        if self.wiki_aborted {
            tracing::error!("Wiki export aborted at the first page error");
        }

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    phase = ?error.phase,
                    key = error.key.as_deref().unwrap_or("-"),
                    message = %error.message,
                    "Export error"
                );
            }
        }
    }
}

/// Pipeline phase an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Tickets,
    Wiki,
    Milestones,
    Users,
    TicketFields,
}

/// Type of export error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportErrorType {
    /// Network failure or timeout
    Connection,
    /// Credentials rejected
    Authentication,
    /// XML-RPC fault or unexpected HTTP status
    Source,
    /// Remote value had an unexpected shape
    Decode,
    /// A required value was absent or malformed
    Validation,
    /// Encoding or filesystem failure
    Storage,
    /// Unknown error
    Unknown,
}

impl ExportErrorType {
    pub fn classify(error: &MigrationError) -> Self {
        match error {
            e if e.is_connection_error() => ExportErrorType::Connection,
            MigrationError::Trac(TracError::AuthenticationFailed(_))
            | MigrationError::GitLab(GitLabError::AuthenticationFailed(_)) => {
                ExportErrorType::Authentication
            }
            MigrationError::Trac(_) | MigrationError::GitLab(_) => ExportErrorType::Source,
            MigrationError::Decode(_) => ExportErrorType::Decode,
            MigrationError::InvalidValue(_) => ExportErrorType::Validation,
            MigrationError::Io(_) | MigrationError::Serialization(_) => ExportErrorType::Storage,
            _ => ExportErrorType::Unknown,
        }
    }
}

/// Export error with context
#[derive(Debug, Clone)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    pub phase: Option<ExportPhase>,

    /// Natural key of the failed record (ticket id, page name, milestone title)
    pub key: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            phase: None,
            key: None,
        }
    }

    pub fn from_migration_error(error: &MigrationError) -> Self {
        Self::new(ExportErrorType::classify(error), error.to_string())
    }

    /// Add context to the error
    pub fn with_context(mut self, phase: ExportPhase, key: impl Into<String>) -> Self {
        self.phase = Some(phase);
        self.key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_summary_creation() {
        let summary = ExportSummary::new();

        assert_eq!(summary.tickets_exported, 0);
        assert_eq!(summary.wiki_versions_exported, 0);
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.errors.is_empty());
        assert!(summary.is_successful());
    }

    #[test]
    fn test_export_summary_with_duration() {
        let summary = ExportSummary::new().with_duration(Duration::from_secs(120));

        assert_eq!(summary.duration, Duration::from_secs(120));
    }

    #[test]
    fn test_wiki_abort_is_not_successful() {
        let mut summary = ExportSummary::new();
        summary.wiki_aborted = true;
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_record_failure_classifies_error() {
        let mut summary = ExportSummary::new();
        summary.record_failure(
            ExportPhase::Tickets,
            "42",
            &MigrationError::Trac(TracError::Timeout("ticket.get".to_string())),
        );
        summary.record_failure(
            ExportPhase::Wiki,
            "WikiStart",
            &MigrationError::Io("disk full".to_string()),
        );

        assert_eq!(summary.errors.len(), 2);
        assert_eq!(summary.errors[0].error_type, ExportErrorType::Connection);
        assert_eq!(summary.errors[0].key.as_deref(), Some("42"));
        assert_eq!(summary.errors[1].error_type, ExportErrorType::Storage);
        assert_eq!(summary.errors[1].phase, Some(ExportPhase::Wiki));
        assert!(summary.has_connection_errors());
    }

    #[test]
    fn test_classify_fault_and_decode() {
        let fault = MigrationError::Trac(TracError::Fault {
            code: 404,
            message: "Ticket 7 does not exist.".to_string(),
        });
        assert_eq!(ExportErrorType::classify(&fault), ExportErrorType::Source);
        assert_eq!(
            ExportErrorType::classify(&MigrationError::Decode("x".to_string())),
            ExportErrorType::Decode
        );
        assert_eq!(
            ExportErrorType::classify(&MigrationError::InvalidValue("x".to_string())),
            ExportErrorType::Validation
        );
    }
}
