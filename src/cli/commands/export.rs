//! Export command implementation
//!
//! This module implements the `export` command, which extracts Trac content
//! into the intermediate store.

use super::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_OK, EXIT_PARTIAL};
use crate::adapters::trac::TracClient;
use crate::config::{load_config, ExportConfig};
use crate::core::export::{ExportCoordinator, ExportSummary};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Override the store directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<String>,

    /// Do not export wiki pages
    #[arg(long)]
    pub skip_wiki: bool,

    /// Do not download attachments
    #[arg(long)]
    pub skip_attachments: bool,

    /// Export closed tickets even if the configuration excludes them
    #[arg(long)]
    pub include_closed: bool,
}

impl ExportArgs {
    /// Applies CLI overrides on top of the configured export settings
    pub fn apply_overrides(&self, export: &mut ExportConfig) {
        if let Some(dir) = &self.export_dir {
            tracing::info!(export_dir = %dir, "Overriding export directory from CLI");
            export.export_dir = dir.clone();
        }
        if self.skip_wiki {
            export.include_wiki = false;
        }
        if self.skip_attachments {
            export.include_attachments = false;
        }
        if self.include_closed {
            export.include_closed_tickets = true;
        }
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        self.apply_overrides(&mut config.export);

        let client = match TracClient::new(&config.trac) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Trac client");
                eprintln!("Failed to initialize Trac client: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = client.validate_plugin_version().await {
            tracing::error!(error = %e, "Trac XML-RPC check failed");
            eprintln!("Cannot use Trac at {}: {e}", config.trac.rpc_url());
            return Ok(EXIT_CONNECTION);
        }
        if let Err(e) = client.validate_expected_methods().await {
            tracing::error!(error = %e, "Trac XML-RPC check failed");
            eprintln!("Cannot use Trac at {}: {e}", config.trac.rpc_url());
            return Ok(EXIT_CONNECTION);
        }

        println!("🚀 Exporting from {} into {}", config.trac.base_url, config.export.export_dir);
        println!();

        let coordinator =
            ExportCoordinator::new(config.export, client).with_shutdown_signal(shutdown_signal);
        let summary = match coordinator.execute_export().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        print_summary(&summary);
        let code = exit_code(&summary);
        match code {
            EXIT_OK => println!("✅ Export completed successfully!"),
            EXIT_INTERRUPTED => {
                println!("⚠️  Export interrupted. Re-run the command to export again.")
            }
            EXIT_CONNECTION => println!("❌ Export failed: Trac could not be reached"),
            _ => println!("⚠️  Export completed with failures"),
        }
        Ok(code)
    }
}

fn print_summary(summary: &ExportSummary) {
    println!("📊 Export Summary:");
    println!(
        "  Tickets: {} exported, {} failed",
        summary.tickets_exported, summary.tickets_failed
    );
    println!(
        "  Attachments: {} exported, {} failed",
        summary.attachments_exported, summary.attachments_failed
    );
    println!(
        "  Wiki: {} pages, {} versions{}",
        summary.wiki_pages_exported,
        summary.wiki_versions_exported,
        if summary.wiki_aborted { " (aborted)" } else { "" }
    );
    println!(
        "  Milestones: {} exported, {} failed",
        summary.milestones_exported, summary.milestones_failed
    );
    println!("  Users: {}", summary.users_exported);
    println!("  Ticket fields: {}", summary.ticket_fields_exported);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!(
                "  - [{}] {:?}: {}",
                error.key.as_deref().unwrap_or("-"),
                error.error_type,
                error.message
            );
        }
        println!();
    }
}

/// Maps an export summary to the process exit code
pub fn exit_code(summary: &ExportSummary) -> i32 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else if summary.is_successful() {
        EXIT_OK
    } else if summary.total_records() == 0 && summary.has_connection_errors() {
        EXIT_CONNECTION
    } else {
        EXIT_PARTIAL
    }
}
