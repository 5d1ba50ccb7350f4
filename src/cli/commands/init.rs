//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "trac2gitlab.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing trac2gitlab configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your Trac and GitLab URLs", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - TRAC_PASSWORD for the Trac account");
                println!("     - GITLAB_TOKEN with api scope (admin for impersonation)");
                println!("  3. Check connectivity: trac2gitlab check");
                println!("  4. Export: trac2gitlab export");
                println!("  5. Preview the import: trac2gitlab migrate --dry-run");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# trac2gitlab configuration

[trac]
base_url = "https://trac.example.com/project"
username = "migration"
password = "${TRAC_PASSWORD}"

[gitlab]
base_url = "https://gitlab.example.com"
token = "${GITLAB_TOKEN}"
project_id = "group/project"

[export]
export_dir = "data"

[import]
impersonate_users = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# trac2gitlab configuration
#
# Values of the form ${NAME} are read from the environment (or a .env file).
# Any key can also be overridden with TRAC2GITLAB_<SECTION>_<KEY>,
# for example TRAC2GITLAB_GITLAB_PROJECT_ID.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Trac (source)
# ============================================================================
[trac]
# Base URL of the Trac project
base_url = "https://trac.example.com/project"

# XML-RPC endpoint relative to base_url; /login/rpc forces authentication
rpc_path = "/login/rpc"

# HTTP basic authentication (optional)
username = "migration"
password = "${TRAC_PASSWORD}"

# Request timeout in seconds
timeout_seconds = 60

# TLS certificate verification
tls_verify = true

# ============================================================================
# GitLab (target)
# ============================================================================
[gitlab]
base_url = "https://gitlab.example.com"
api_path = "/api/v4"

# Personal access token with api scope; impersonation needs an administrator
token = "${GITLAB_TOKEN}"

# Numeric project id or namespace/project path
project_id = "group/project"

timeout_seconds = 60

# ============================================================================
# Export
# ============================================================================
[export]
# Root of the intermediate store
export_dir = "data"

include_wiki = true
include_attachments = true
include_closed_tickets = true
include_users = true
include_ticket_fields = true

# Concurrent ticket workers (1-100)
ticket_workers = 10

# Concurrent wiki pages (1-100)
wiki_concurrency = 10

# ============================================================================
# Import
# ============================================================================
[import]
import_milestones = true
import_issues = true

# Create new issues as their Trac reporter using impersonation tokens
impersonate_users = false

# Create GitLab users for reporters with an email address but no account
create_users = false

# Name of the impersonation tokens issued (and revoked) by the import
impersonation_token_name = "trac2gitlab-import"

# Maximum records read from one store directory
max_files = 1000

# Log planned changes without writing
dry_run = false

# ============================================================================
# Logging
# ============================================================================
[logging]
# Write JSON logs to rolling files
local_enabled = false
local_path = "./logs"

# Rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}
