//! Ticket export
//!
//! Ticket ids are queued on a bounded channel that is closed once every id is
//! enqueued. A fixed number of workers drain it; each worker writes one
//! ticket file at a time and then downloads that ticket's attachments
//! concurrently. Ticket failures are logged and reported, never fatal.

use crate::adapters::trac::{AttachmentParent, TracClient};
use crate::core::store::{write_bytes, write_json, StoreLayout};
use crate::domain::{Attachment, MigrationError, Result};
use crate::log_record_skipped;
use async_channel as chan;
use futures::future::join_all;
use std::sync::Arc;

/// Source query selecting the tickets to export
///
/// `max=0` lifts the server's page limit.
pub fn ticket_query(include_closed: bool) -> String {
    if include_closed {
        "max=0".to_string()
    } else {
        "max=0&status!=closed".to_string()
    }
}

/// Result of exporting one ticket
#[derive(Debug)]
pub enum TicketOutcome {
    /// The ticket file was written; attachment failures are aggregated
    Exported {
        id: i64,
        attachments_written: usize,
        attachments_failed: usize,
        attachment_error: Option<MigrationError>,
    },
    /// The ticket could not be fetched or written
    Failed { id: i64, error: MigrationError },
}

impl TicketOutcome {
    pub fn id(&self) -> i64 {
        match self {
            TicketOutcome::Exported { id, .. } | TicketOutcome::Failed { id, .. } => *id,
        }
    }
}

/// Exports tickets into the store with a worker pool
#[derive(Clone)]
pub struct TicketExporter {
    client: TracClient,
    layout: StoreLayout,
    workers: usize,
    include_attachments: bool,
}

impl TicketExporter {
    pub fn new(
        client: TracClient,
        layout: StoreLayout,
        workers: usize,
        include_attachments: bool,
    ) -> Self {
        Self {
            client,
            layout,
            workers: workers.max(1),
            include_attachments,
        }
    }

    /// Queries ticket ids and exports each of them
    ///
    /// # Errors
    ///
    /// Only the id query can fail the phase; per-ticket failures are
    /// returned as [`TicketOutcome::Failed`].
    pub async fn export(&self, include_closed: bool) -> Result<Vec<TicketOutcome>> {
        let query = ticket_query(include_closed);
        let ids = self.client.query_ticket_ids(&query).await?;
        tracing::info!(tickets = ids.len(), workers = self.workers, "Exporting tickets");
        Ok(self.export_ids(ids).await)
    }

    /// Exports the given ids; every id is processed exactly once
    pub async fn export_ids(&self, ids: Vec<i64>) -> Vec<TicketOutcome> {
        let (tx, rx) = chan::bounded(usize::max(ids.len(), 1));
        for id in ids {
            // Capacity covers every id and the receiver is alive, so this cannot fail
            if tx.send(id).await.is_err() {
                break;
            }
        }
        tx.close();

        let exporter = Arc::new(self.clone());
        let handles: Vec<_> = (0..self.workers)
            .map(|worker| {
                let rx = rx.clone();
                let exporter = Arc::clone(&exporter);
                tokio::spawn(async move { exporter.run_worker(worker, rx).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(mut worker_outcomes) => outcomes.append(&mut worker_outcomes),
                Err(e) => tracing::error!(error = %e, "Ticket worker panicked"),
            }
        }
        outcomes
    }

    async fn run_worker(&self, worker: usize, rx: chan::Receiver<i64>) -> Vec<TicketOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(id) = rx.recv().await {
            tracing::debug!(worker, ticket_id = id, "Exporting ticket");
            outcomes.push(self.export_one(id).await);
        }
        tracing::debug!(worker, processed = outcomes.len(), "Ticket worker finished");
        outcomes
    }

    /// Fetches, writes and downloads the attachments of one ticket
    pub async fn export_one(&self, id: i64) -> TicketOutcome {
        let ticket = match self.client.get_ticket(id).await {
            Ok(ticket) => ticket,
            Err(e) => {
                let error = e.with_key(format!("ticket {id}"));
                log_record_skipped!("ticket", id, error);
                return TicketOutcome::Failed { id, error };
            }
        };

        if let Err(e) = write_json(&self.layout.ticket_file(id), &ticket).await {
            let error = e.with_key(format!("ticket {id}"));
            log_record_skipped!("ticket", id, error);
            return TicketOutcome::Failed { id, error };
        }

        if !self.include_attachments || ticket.attachments.is_empty() {
            return TicketOutcome::Exported {
                id,
                attachments_written: 0,
                attachments_failed: 0,
                attachment_error: None,
            };
        }

        let results = join_all(
            ticket
                .attachments
                .iter()
                .map(|attachment| self.export_attachment(id, attachment)),
        )
        .await;

        let total = results.len();
        let failures: Vec<MigrationError> = results.into_iter().filter_map(|r| r.err()).collect();
        let attachments_failed = failures.len();
        let attachment_error = aggregate_attachment_errors(id, total, failures);
        if let Some(error) = &attachment_error {
            tracing::warn!(ticket_id = id, error = %error, "Ticket attachments incomplete");
        }

        TicketOutcome::Exported {
            id,
            attachments_written: total - attachments_failed,
            attachments_failed,
            attachment_error,
        }
    }

    async fn export_attachment(&self, id: i64, attachment: &Attachment) -> Result<()> {
        let bytes = self
            .client
            .get_attachment(AttachmentParent::Ticket(id), &attachment.filename)
            .await
            .map_err(|e| e.with_key(&attachment.filename))?;
        write_bytes(
            &self.layout.ticket_attachment_file(id, &attachment.filename),
            &bytes,
        )
        .await
        .map_err(|e| e.with_key(&attachment.filename))
    }
}

/// Joins per-attachment failures into one error for the ticket
fn aggregate_attachment_errors(
    id: i64,
    total: usize,
    failures: Vec<MigrationError>,
) -> Option<MigrationError> {
    if failures.is_empty() {
        return None;
    }
    let details: Vec<String> = failures.iter().map(ToString::to_string).collect();
    Some(MigrationError::Export(format!(
        "ticket {id}: {} of {total} attachments failed: {}",
        failures.len(),
        details.join("; ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_query() {
        assert_eq!(ticket_query(true), "max=0");
        assert_eq!(ticket_query(false), "max=0&status!=closed");
    }

    #[test]
    fn test_aggregate_attachment_errors() {
        assert!(aggregate_attachment_errors(3, 2, vec![]).is_none());

        let error = aggregate_attachment_errors(
            3,
            3,
            vec![
                MigrationError::Io("a.png: disk full".to_string()),
                MigrationError::Decode("b.txt: expected base64".to_string()),
            ],
        )
        .unwrap();
        let message = error.to_string();
        assert!(message.contains("ticket 3: 2 of 3 attachments failed"));
        assert!(message.contains("a.png"));
        assert!(message.contains("b.txt"));
    }
}
