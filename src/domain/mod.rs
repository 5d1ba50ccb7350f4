//! Domain models and types for trac2gitlab.
//!
//! This module contains the records that travel from Trac, through the
//! intermediate store, into GitLab, together with the error types.
//!
//! # Overview
//!
//! - **Records** ([`Ticket`], [`Milestone`], [`WikiPageInfo`], [`TicketField`])
//! - **Typed attributes** ([`AttributeValue`])
//! - **Error types** ([`MigrationError`], [`TracError`], [`GitLabError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, MigrationError>`]:
//!
//! ```rust
//! use trac2gitlab::domain::{MigrationError, Result};
//!
//! fn example() -> Result<()> {
//!     let _config = trac2gitlab::config::load_config("trac2gitlab.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod milestone;
pub mod result;
pub mod search;
pub mod ticket;
pub mod value;
pub mod wiki;

// Re-export commonly used types for convenience
pub use errors::{GitLabError, MigrationError, TracError};
pub use milestone::Milestone;
pub use result::Result;
pub use search::{SearchFilter, SearchResult};
pub use ticket::{Attachment, ChangeLogEntry, Ticket, TicketField, TicketHistory};
pub use value::{AttributeValue, Attributes};
pub use wiki::{WikiPageInfo, WikiPageVersion};
