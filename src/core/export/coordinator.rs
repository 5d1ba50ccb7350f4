//! Export coordinator - main orchestrator for the export process
//!
//! Runs the enabled export phases against one Trac instance and collects
//! their results into an [`ExportSummary`]. Phases run one after another:
//! tickets, wiki, milestones, ticket fields, users.

use crate::adapters::trac::TracClient;
use crate::config::ExportConfig;
use crate::core::export::fields::export_ticket_fields;
use crate::core::export::milestones::export_milestones;
use crate::core::export::summary::{ExportPhase, ExportSummary};
use crate::core::export::tickets::{TicketExporter, TicketOutcome};
use crate::core::export::users::export_users;
use crate::core::export::wiki::WikiExporter;
use crate::core::store::StoreLayout;
use crate::domain::Result;
use crate::log_phase_complete;
use std::time::Instant;
use tokio::sync::watch;

/// Export coordinator
pub struct ExportCoordinator {
    config: ExportConfig,
    client: TracClient,
    layout: StoreLayout,
    shutdown_signal: Option<watch::Receiver<bool>>,
}

impl ExportCoordinator {
    /// Create a new export coordinator writing below `config.export_dir`
    pub fn new(config: ExportConfig, client: TracClient) -> Self {
        let layout = StoreLayout::new(&config.export_dir);
        Self {
            config,
            client,
            layout,
            shutdown_signal: None,
        }
    }

    /// Stop between phases once `signal` turns true
    pub fn with_shutdown_signal(mut self, signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    fn shutdown_requested(&self, summary: &mut ExportSummary) -> bool {
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

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Execute the export
    ///
    /// Record-level failures are collected in the summary. A phase whose
    /// listing call fails is recorded as one error and the next phase runs.
    /// A shutdown signal lets the running phase finish and skips the rest.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new();

        tracing::info!(export_dir = %self.layout.root().display(), "Starting export process");

        self.export_tickets(&mut summary).await;

        if self.config.include_wiki && !self.shutdown_requested(&mut summary) {
            self.export_wiki(&mut summary).await;
        }

        if !self.shutdown_requested(&mut summary) {
            self.export_milestones(&mut summary).await;
        }

        if self.config.include_ticket_fields && !self.shutdown_requested(&mut summary) {
            let phase_start = Instant::now();
            match export_ticket_fields(&self.client, &self.layout).await {
                Ok(count) => {
                    summary.ticket_fields_exported = count;
                    log_phase_complete!("ticket_fields", count, phase_start.elapsed());
                }
                Err(e) => summary.record_failure(ExportPhase::TicketFields, "ticket-fields", &e),
            }
        }

        if self.config.include_users && !self.shutdown_requested(&mut summary) {
            let phase_start = Instant::now();
            match export_users(&self.client, &self.layout).await {
                Ok(count) => {
                    summary.users_exported = count;
                    log_phase_complete!("users", count, phase_start.elapsed());
                }
                Err(e) => summary.record_failure(ExportPhase::Users, "users", &e),
            }
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    async fn export_tickets(&self, summary: &mut ExportSummary) {
        let phase_start = Instant::now();
        let exporter = TicketExporter::new(
            self.client.clone(),
            self.layout.clone(),
            self.config.ticket_workers,
            self.config.include_attachments,
        );

        let outcomes = match exporter.export(self.config.include_closed_tickets).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                summary.record_failure(ExportPhase::Tickets, "ticket.query", &e);
                return;
            }
        };

        for outcome in outcomes {
            match outcome {
                TicketOutcome::Exported {
                    id,
                    attachments_written,
                    attachments_failed,
                    attachment_error,
                } => {
                    summary.tickets_exported += 1;
                    summary.attachments_exported += attachments_written;
                    summary.attachments_failed += attachments_failed;
                    if let Some(error) = attachment_error {
                        summary.record_failure(ExportPhase::Tickets, id.to_string(), &error);
                    }
                }
                TicketOutcome::Failed { id, error } => {
                    summary.tickets_failed += 1;
                    summary.record_failure(ExportPhase::Tickets, id.to_string(), &error);
                }
            }
        }

        log_phase_complete!("tickets", summary.tickets_exported, phase_start.elapsed());
    }

    async fn export_wiki(&self, summary: &mut ExportSummary) {
        let phase_start = Instant::now();
        let exporter = WikiExporter::new(
            self.client.clone(),
            self.layout.clone(),
            self.config.wiki_concurrency,
            self.config.include_attachments,
        );

        let export = match exporter.export().await {
            Ok(export) => export,
            Err(e) => {
                summary.record_failure(ExportPhase::Wiki, "wiki.getAllPages", &e);
                summary.wiki_aborted = true;
                return;
            }
        };

        summary.wiki_pages_exported = export.pages.len();
        summary.wiki_versions_exported = export.versions_written();
        for page in &export.pages {
            summary.attachments_exported += page.attachments_written;
            summary.attachments_failed += page.attachments_failed;
        }

        if let Some(error) = &export.error {
            summary.wiki_aborted = true;
            summary.record_failure(ExportPhase::Wiki, "wiki", error);
        }

        log_phase_complete!("wiki", summary.wiki_versions_exported, phase_start.elapsed());
    }

    async fn export_milestones(&self, summary: &mut ExportSummary) {
        let phase_start = Instant::now();
        let export = match export_milestones(&self.client, &self.layout).await {
            Ok(export) => export,
            Err(e) => {
                summary.record_failure(ExportPhase::Milestones, "ticket.milestone.getAll", &e);
                return;
            }
        };

        summary.milestones_exported = export.exported.len();
        summary.milestones_failed = export.failed.len();
        for (name, error) in &export.failed {
            summary.record_failure(ExportPhase::Milestones, name.clone(), error);
        }

        log_phase_complete!("milestones", summary.milestones_exported, phase_start.elapsed());
    }
}
