//! Milestone export
//!
//! Milestones are few; they are fetched and written one after another.

use crate::adapters::trac::TracClient;
use crate::core::store::{write_json, StoreLayout};
use crate::domain::{MigrationError, Result};
use crate::log_record_skipped;

/// Per-milestone results of one run
#[derive(Debug, Default)]
pub struct MilestoneExport {
    pub exported: Vec<String>,
    pub failed: Vec<(String, MigrationError)>,
}

/// Writes every milestone to `milestones/milestone-<title>.json`
///
/// # Errors
///
/// Only if the milestone list cannot be fetched.
pub async fn export_milestones(client: &TracClient, layout: &StoreLayout) -> Result<MilestoneExport> {
    let names = client.milestone_names().await?;
    tracing::info!(milestones = names.len(), "Exporting milestones");

    let mut export = MilestoneExport::default();
    for name in names {
        let result: Result<()> = async {
            let milestone = client.milestone(&name).await?;
            write_json(&layout.milestone_file(&milestone.name), &milestone).await
        }
        .await;

        match result {
            Ok(()) => export.exported.push(name),
            Err(e) => {
                let error = e.with_key(format!("milestone {name}"));
                log_record_skipped!("milestone", name, error);
                export.failed.push((name, error));
            }
        }
    }
    Ok(export)
}
