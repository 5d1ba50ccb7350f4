// trac2gitlab - Trac to GitLab migration tool
// Copyright (c) 2025 trac2gitlab Contributors
// Licensed under the MIT License

//! # trac2gitlab - Trac to GitLab migration
//!
//! trac2gitlab moves a Trac project into GitLab in two phases:
//!
//! - **Export** reads tickets, wiki page histories, milestones, users and
//!   ticket field definitions over the Trac XML-RPC plugin and writes them
//!   to an on-disk store, one file per entity
//! - **Import** reconciles the store against a GitLab project, creating
//!   missing milestones and issues and sending only the fields that differ
//!
//! Running the import twice against unchanged data writes nothing the
//! second time.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export pipeline, store, markup conversion and sync engine
//! - [`adapters`] - Trac XML-RPC reader and GitLab REST writer
//! - [`domain`] - Tickets, milestones, wiki pages and errors
//! - [`config`] - TOML configuration with environment overrides
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trac2gitlab::adapters::gitlab::{GitLabApi, GitLabClient};
//! use trac2gitlab::config::load_config;
//! use trac2gitlab::core::store::StoreLayout;
//! use trac2gitlab::core::sync::SyncCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("trac2gitlab.toml")?;
//! let client: Arc<dyn GitLabApi> = Arc::new(GitLabClient::new(&config.gitlab)?);
//! let layout = StoreLayout::new(&config.export.export_dir);
//!
//! let summary = SyncCoordinator::new(config.import, client, layout)
//!     .execute_import()
//!     .await?;
//! println!("{} issues created", summary.issues.created);
//! # Ok(())
//! # }
//! ```
//!
//! ## Markup conversion
//!
//! ```rust
//! use trac2gitlab::core::transform::convert;
//!
//! assert_eq!(convert("'''bold'''"), "**bold**");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
