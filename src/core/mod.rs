//! Core migration logic for trac2gitlab.
//!
//! # Modules
//!
//! - [`transform`] - Trac markup to Markdown and XML-RPC value normalization
//! - [`export`] - Export pipeline from Trac into the intermediate store
//! - [`store`] - Intermediate on-disk store layout and record I/O
//! - [`sync`] - Idempotent synchronization of the store into GitLab
//!
//! # Workflow
//!
//! 1. **Export**: tickets, wiki versions, milestones and users are written
//!    to the store, one file per entity
//! 2. **Import**: the store is reconciled against the GitLab project; only
//!    differences are sent
//!
//! # Example
//!
//! ```rust,no_run
//! use trac2gitlab::adapters::trac::TracClient;
//! use trac2gitlab::config::load_config;
//! use trac2gitlab::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("trac2gitlab.toml")?;
//! let client = TracClient::new(&config.trac)?;
//!
//! let coordinator = ExportCoordinator::new(config.export, client);
//! let summary = coordinator.execute_export().await?;
//!
//! println!("Tickets: {}", summary.tickets_exported);
//! println!("Wiki versions: {}", summary.wiki_versions_exported);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod store;
pub mod sync;
pub mod transform;
