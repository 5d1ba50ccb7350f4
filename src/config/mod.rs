//! Configuration management for trac2gitlab.
//!
//! trac2gitlab uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TRAC2GITLAB_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [trac]
//! base_url = "https://trac.example.com/project"
//! username = "migration"
//! password = "${TRAC_PASSWORD}"
//!
//! [gitlab]
//! base_url = "https://gitlab.example.com"
//! token = "${GITLAB_TOKEN}"
//! project_id = "group/project"
//!
//! [export]
//! export_dir = "data"
//! include_closed_tickets = true
//!
//! [import]
//! impersonate_users = false
//! ```
//!
//! # Loading
//!
//! ```rust,no_run
//! use trac2gitlab::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("trac2gitlab.toml")?;
//! println!("Trac RPC endpoint: {}", config.trac.rpc_url());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExportConfig, GitLabConfig, ImportConfig, LoggingConfig, MigrationConfig,
    TracConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
