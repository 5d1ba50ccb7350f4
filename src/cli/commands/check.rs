//! Check command implementation
//!
//! Verifies that Trac exposes a usable XML-RPC plugin and that the GitLab
//! token can see the configured project.

use super::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_OK};
use crate::adapters::gitlab::{GitLabApi, GitLabClient};
use crate::adapters::trac::TracClient;
use crate::config::{load_config, GitLabConfig, TracConfig};
use crate::domain::Result;
use clap::Args;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only check the Trac side
    #[arg(long)]
    pub skip_gitlab: bool,
}

impl CheckArgs {
    /// Execute the check command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("🔍 Checking Trac at {}", config.trac.rpc_url());
        let mut healthy = match check_trac(&config.trac).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Trac check failed");
                println!("❌ Trac: {e}");
                false
            }
        };

        if !self.skip_gitlab {
            if let Err(e) = config.validate_import() {
                println!("❌ GitLab configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
            println!();
            println!("🔍 Checking GitLab at {}", config.gitlab.api_url());
            if let Err(e) = check_gitlab(&config.gitlab).await {
                tracing::error!(error = %e, "GitLab check failed");
                println!("❌ GitLab: {e}");
                healthy = false;
            }
        }

        println!();
        if healthy {
            println!("✅ All checks passed");
            Ok(EXIT_OK)
        } else {
            Ok(EXIT_CONNECTION)
        }
    }
}

async fn check_trac(config: &TracConfig) -> Result<()> {
    let client = TracClient::new(config)?;
    let version = client.validate_plugin_version().await?;
    println!("  ✅ XML-RPC plugin API {version}");
    client.validate_expected_methods().await?;
    println!("  ✅ Required methods available");
    Ok(())
}

async fn check_gitlab(config: &GitLabConfig) -> Result<()> {
    let client = GitLabClient::new(config)?;
    let version = client.version().await?;
    println!("  ✅ GitLab {} ({})", version.version, version.revision);

    let user = client.current_user().await?;
    println!(
        "  ✅ Authenticated as {}{}",
        user.username,
        if user.is_admin { " (administrator)" } else { "" }
    );

    let project = client.get_project().await?;
    println!("  ✅ Project {} (id {})", project.path_with_namespace, project.id);
    Ok(())
}
