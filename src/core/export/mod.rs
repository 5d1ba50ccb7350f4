//! Export pipeline
//!
//! This module extracts Trac content into the intermediate store:
//! - Ticket export over a fixed worker pool
//! - Wiki export with bounded concurrency and first-error abort
//! - Sequential milestone, ticket field and user export
//! - Export coordination and summary reporting

pub mod coordinator;
pub mod fields;
pub mod milestones;
pub mod summary;
pub mod tickets;
pub mod users;
pub mod wiki;

pub use coordinator::ExportCoordinator;
pub use summary::{ExportError, ExportErrorType, ExportPhase, ExportSummary};
pub use tickets::{ticket_query, TicketExporter, TicketOutcome};
pub use users::collect_users;
pub use wiki::{WikiExport, WikiExporter, WikiPageOutcome};
