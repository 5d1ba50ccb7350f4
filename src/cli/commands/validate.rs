//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the trac2gitlab configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also require the GitLab settings the migrate command needs
    #[arg(long)]
    pub for_import: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let result = if self.for_import {
            config.validate_import()
        } else {
            config.validate()
        };

        match result {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!("  Trac RPC: {}", config.trac.rpc_url());
                println!(
                    "  Trac User: {}",
                    config.trac.username.as_deref().unwrap_or("(anonymous)")
                );
                println!("  GitLab API: {}", config.gitlab.api_url());
                println!("  GitLab Project: {}", config.gitlab.project_id);
                println!("  Export Directory: {}", config.export.export_dir);
                println!(
                    "  Workers: {} tickets, {} wiki pages",
                    config.export.ticket_workers, config.export.wiki_concurrency
                );
                println!(
                    "  Impersonation: {}",
                    if config.import.impersonate_users { "on" } else { "off" }
                );
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(EXIT_CONFIG)
            }
        }
    }
}
