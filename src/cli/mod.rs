//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for trac2gitlab using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// trac2gitlab - Trac to GitLab migration tool
#[derive(Parser, Debug)]
#[command(name = "trac2gitlab")]
#[command(version, about, long_about = None)]
#[command(author = "trac2gitlab Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "trac2gitlab.toml", env = "TRAC2GITLAB_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TRAC2GITLAB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export tickets, wiki pages and milestones from Trac into the store
    Export(commands::export::ExportArgs),

    /// Synchronize the exported store into a GitLab project
    Migrate(commands::migrate::MigrateArgs),

    /// Check connectivity and versions of both systems
    Check(commands::check::CheckArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
