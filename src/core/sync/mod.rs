//! Idempotent synchronization into GitLab
//!
//! Exported records are reconciled against the live project rather than
//! replayed: entities are matched by natural key (ticket id as issue IID,
//! milestone title), only differing fields are sent, and open/closed changes
//! are sent as state events. Running the import twice sends nothing the
//! second time.

pub mod coordinator;
pub mod issues;
pub mod milestones;
pub mod plan;
pub mod summary;

pub use coordinator::SyncCoordinator;
pub use issues::IssueSync;
pub use milestones::MilestoneSync;
pub use plan::{
    find_milestone, plan_issue_create, plan_issue_update, plan_milestone_create,
    plan_milestone_update, resolve_milestone_id,
};
pub use summary::{EntityCounts, EntityKind, ImportError, ImportSummary, SyncAction};
