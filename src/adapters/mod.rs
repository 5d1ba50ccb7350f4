//! External system integrations for trac2gitlab.
//!
//! - [`trac`] - Trac XML-RPC source (transport, codec and typed client)
//! - [`gitlab`] - GitLab REST target (trait, reqwest client, sessions)
//!
//! # Design Pattern
//!
//! Each system sits behind a trait ([`trac::RpcTransport`],
//! [`gitlab::GitLabApi`]) so the export pipeline and the sync engine can be
//! tested against in-memory implementations.
//!
//! ```rust,no_run
//! use trac2gitlab::adapters::gitlab::{GitLabApi, GitLabClient};
//! use trac2gitlab::adapters::trac::TracClient;
//! use trac2gitlab::config::load_config;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("trac2gitlab.toml")?;
//!
//! let trac = TracClient::new(&config.trac)?;
//! let version = trac.validate_plugin_version().await?;
//!
//! let gitlab: Arc<dyn GitLabApi> = Arc::new(GitLabClient::new(&config.gitlab)?);
//! let project = gitlab.get_project().await?;
//! println!("Trac XML-RPC {version}, GitLab project {}", project.name);
//! # Ok(())
//! # }
//! ```

pub mod gitlab;
pub mod trac;
