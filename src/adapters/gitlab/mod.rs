//! GitLab REST target adapter
//!
//! - [`api`]: the [`GitLabApi`] trait the sync engine is written against
//! - [`client`]: reqwest implementation
//! - [`models`]: request and response bodies
//! - [`session`]: impersonation session cache

pub mod api;
pub mod client;
pub mod models;
pub mod session;

pub use api::GitLabApi;
pub use client::GitLabClient;
pub use models::{
    CreateImpersonationToken, CreateIssue, CreateMilestone, CreateUser, ImpersonationToken, Issue,
    IssueStateEvent, LifecycleState, Milestone, MilestoneStateEvent, Project, UpdateIssue,
    UpdateMilestone, User, VersionInfo,
};
pub use session::{UserSession, UserSessionCache};
