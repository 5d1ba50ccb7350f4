//! GitLab API trait definition
//!
//! [`GitLabApi`] is the seam between the sync engine and the GitLab REST
//! API. [`super::GitLabClient`] implements it over HTTP; tests implement it
//! in memory. Every call is scoped to the project the client was configured
//! with.

use super::models::{
    CreateImpersonationToken, CreateIssue, CreateMilestone, CreateUser, ImpersonationToken, Issue,
    Milestone, Project, UpdateIssue, UpdateMilestone, User, VersionInfo,
};
use crate::config::SecretString;
use crate::domain::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the migration needs from GitLab
///
/// # Example
///
/// ```no_run
/// use trac2gitlab::adapters::gitlab::{GitLabApi, GitLabClient};
/// use trac2gitlab::config::GitLabConfig;
///
/// # async fn example() -> trac2gitlab::domain::Result<()> {
/// let client = GitLabClient::new(&GitLabConfig::default())?;
///
/// let project = client.get_project().await?;
/// let milestones = client.list_milestones().await?;
/// println!("{} has {} milestones", project.name, milestones.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait GitLabApi: Send + Sync {
    /// The configured project
    ///
    /// # Errors
    ///
    /// `GitLabError::NotFound` if the project does not exist or is not visible
    /// to the token.
    async fn get_project(&self) -> Result<Project>;

    async fn version(&self) -> Result<VersionInfo>;

    /// The user the token belongs to
    async fn current_user(&self) -> Result<User>;

    /// All milestones of the project, any state
    async fn list_milestones(&self) -> Result<Vec<Milestone>>;

    async fn create_milestone(&self, milestone: &CreateMilestone) -> Result<Milestone>;

    async fn update_milestone(&self, milestone_id: u64, update: &UpdateMilestone)
        -> Result<Milestone>;

    /// Issue by project-scoped number; `None` if it does not exist
    async fn get_issue(&self, iid: i64) -> Result<Option<Issue>>;

    /// All issues of the project, any state
    async fn list_issues(&self) -> Result<Vec<Issue>>;

    async fn create_issue(&self, issue: &CreateIssue) -> Result<Issue>;

    async fn update_issue(&self, iid: i64, update: &UpdateIssue) -> Result<Issue>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Requires an administrator token
    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn list_impersonation_tokens(&self, user_id: u64) -> Result<Vec<ImpersonationToken>>;

    async fn create_impersonation_token(
        &self,
        user_id: u64,
        token: &CreateImpersonationToken,
    ) -> Result<ImpersonationToken>;

    async fn revoke_impersonation_token(&self, user_id: u64, token_id: u64) -> Result<()>;

    /// A client for the same project acting with `token`
    fn impersonate(&self, token: SecretString) -> Result<Arc<dyn GitLabApi>>;
}
