//! Migrate command implementation
//!
//! This module implements the `migrate` command, which synchronizes the
//! exported store into the configured GitLab project.

use super::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_OK, EXIT_PARTIAL};
use crate::adapters::gitlab::{GitLabApi, GitLabClient};
use crate::config::{load_config, ImportConfig};
use crate::core::store::StoreLayout;
use crate::core::sync::{ImportSummary, SyncCoordinator};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Do not synchronize milestones
    #[arg(long)]
    pub skip_milestones: bool,

    /// Do not synchronize issues
    #[arg(long)]
    pub skip_issues: bool,

    /// Log planned changes without writing to GitLab
    #[arg(long)]
    pub dry_run: bool,

    /// Override the store directory to read from
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<String>,
}

impl MigrateArgs {
    pub fn apply_overrides(&self, import: &mut ImportConfig) {
        if self.skip_milestones {
            import.import_milestones = false;
        }
        if self.skip_issues {
            import.import_issues = false;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            import.dry_run = true;
        }
    }

    /// Execute the migrate command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting migrate command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        self.apply_overrides(&mut config.import);
        if let Some(dir) = &self.export_dir {
            config.export.export_dir = dir.clone();
        }

        if let Err(e) = config.validate_import() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let client: Arc<dyn GitLabApi> = match GitLabClient::new(&config.gitlab) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create GitLab client");
                eprintln!("Failed to initialize GitLab client: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if config.import.dry_run {
            println!("🔍 DRY RUN MODE - No changes will be written to GitLab");
            println!();
        }
        println!(
            "🚀 Migrating {} into {} ({})",
            config.export.export_dir, config.gitlab.project_id, config.gitlab.base_url
        );
        println!();

        let layout = StoreLayout::new(&config.export.export_dir);
        let coordinator = SyncCoordinator::new(config.import, client, layout)
            .with_shutdown_signal(shutdown_signal);

        let summary = match coordinator.execute_import().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Migration failed");
                eprintln!("Migration failed: {e}");
                return Ok(if e.is_connection_error() {
                    EXIT_CONNECTION
                } else {
                    EXIT_FATAL
                });
            }
        };

        print_summary(&summary);
        let code = exit_code(&summary);
        match code {
            EXIT_OK => println!("✅ Migration completed successfully!"),
            EXIT_INTERRUPTED => println!("⚠️  Migration interrupted. Re-running is safe."),
            _ => println!("⚠️  Migration completed with failures"),
        }
        Ok(code)
    }
}

fn print_summary(summary: &ImportSummary) {
    let verb = if summary.dry_run { "planned" } else { "done" };
    println!("📊 Migration Summary ({verb}):");
    for (label, counts) in [("Milestones", &summary.milestones), ("Issues", &summary.issues)] {
        println!(
            "  {label}: {} created, {} updated, {} unchanged, {} failed",
            counts.created, counts.updated, counts.unchanged, counts.failed
        );
    }
    if summary.tokens_revoked > 0 {
        println!("  Impersonation tokens revoked: {}", summary.tokens_revoked);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {} {}: {}", error.kind, error.key, error.message);
        }
        println!();
    }
}

/// Maps an import summary to the process exit code
pub fn exit_code(summary: &ImportSummary) -> i32 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else if summary.is_successful() {
        EXIT_OK
    } else {
        EXIT_PARTIAL
    }
}
