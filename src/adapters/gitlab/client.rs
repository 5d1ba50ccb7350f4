//! GitLab REST client
//!
//! Implements [`GitLabApi`] with reqwest against the v4 API. Authentication
//! uses the `PRIVATE-TOKEN` header; list endpoints are followed page by page
//! through the `X-Next-Page` response header.

use super::api::GitLabApi;
use super::models::{
    CreateImpersonationToken, CreateIssue, CreateMilestone, CreateUser, ImpersonationToken, Issue,
    Milestone, Project, UpdateIssue, UpdateMilestone, User, VersionInfo,
};
use crate::config::{GitLabConfig, SecretString};
use crate::domain::{GitLabError, MigrationError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const PRIVATE_TOKEN: &str = "PRIVATE-TOKEN";
const NEXT_PAGE: &str = "x-next-page";
const PER_PAGE: &str = "100";

/// GitLab client bound to one project
#[derive(Clone)]
pub struct GitLabClient {
    api_url: String,
    project: String,
    client: Client,
    token: Option<SecretString>,
    config: GitLabConfig,
}

impl GitLabClient {
    /// Create a client for the configured project
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("trac2gitlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GitLabError::ConnectionFailed(format!("Failed to build HTTP client: {e}"))
            })?;

        tracing::debug!(
            api_url = %config.api_url(),
            project = %config.project_id,
            "Creating GitLab client"
        );

        Ok(Self {
            api_url: config.api_url(),
            project: encode_project_id(&config.project_id),
            client,
            token: config.token.clone(),
            config: config.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }

    fn project_path(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("projects/{}", self.project)
        } else {
            format!("projects/{}/{suffix}", self.project)
        }
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.header(PRIVATE_TOKEN, token.expose_secret().as_ref()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitLabError::Timeout(format!("{context}: {e}"))
            } else {
                GitLabError::ConnectionFailed(format!("{context}: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GitLabError::AuthenticationFailed(format!("{context}: {status}"))
            }
            StatusCode::NOT_FOUND => GitLabError::NotFound(context.to_string()),
            s if s.is_server_error() => GitLabError::ServerError {
                status: s.as_u16(),
                message: body,
            },
            s => GitLabError::ClientError {
                status: s.as_u16(),
                message: body,
            },
        };
        Err(error.into())
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| GitLabError::InvalidResponse(format!("{context}: {e}")).into())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.client.get(self.url(path)), path).await?;
        Self::decode(response, path).await
    }

    /// Follows `X-Next-Page` until the last page
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = "1".to_string();

        loop {
            let request = self
                .client
                .get(self.url(path))
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page.as_str())]);
            let response = self.send(request, path).await?;

            let next = response
                .headers()
                .get(NEXT_PAGE)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let batch: Vec<T> = Self::decode(response, path).await?;
            tracing::trace!(path, page = %page, count = batch.len(), "Fetched page");
            items.extend(batch);

            match next {
                Some(n) => page = n,
                None => break,
            }
        }

        Ok(items)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.client.post(self.url(path)).json(body), path)
            .await?;
        Self::decode(response, path).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .send(self.client.put(self.url(path)).json(body), path)
            .await?;
        Self::decode(response, path).await
    }
}

#[async_trait]
impl GitLabApi for GitLabClient {
    async fn get_project(&self) -> Result<Project> {
        self.get(&self.project_path("")).await
    }

    async fn version(&self) -> Result<VersionInfo> {
        self.get("version").await
    }

    async fn current_user(&self) -> Result<User> {
        self.get("user").await
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>> {
        self.get_all(&self.project_path("milestones"), &[]).await
    }

    async fn create_milestone(&self, milestone: &CreateMilestone) -> Result<Milestone> {
        self.post(&self.project_path("milestones"), milestone).await
    }

    async fn update_milestone(
        &self,
        milestone_id: u64,
        update: &UpdateMilestone,
    ) -> Result<Milestone> {
        self.put(&self.project_path(&format!("milestones/{milestone_id}")), update)
            .await
    }

    async fn get_issue(&self, iid: i64) -> Result<Option<Issue>> {
        match self
            .get::<Issue>(&self.project_path(&format!("issues/{iid}")))
            .await
        {
            Ok(issue) => Ok(Some(issue)),
            Err(MigrationError::GitLab(GitLabError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        self.get_all(&self.project_path("issues"), &[("scope", "all")])
            .await
    }

    async fn create_issue(&self, issue: &CreateIssue) -> Result<Issue> {
        self.post(&self.project_path("issues"), issue).await
    }

    async fn update_issue(&self, iid: i64, update: &UpdateIssue) -> Result<Issue> {
        self.put(&self.project_path(&format!("issues/{iid}")), update)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.get_all("users", &[("search", email)]).await?;
        Ok(users.into_iter().find(|u| u.has_email(email)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.get_all("users", &[("username", username)]).await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        self.post("users", user).await
    }

    async fn list_impersonation_tokens(&self, user_id: u64) -> Result<Vec<ImpersonationToken>> {
        self.get_all(&format!("users/{user_id}/impersonation_tokens"), &[])
            .await
    }

    async fn create_impersonation_token(
        &self,
        user_id: u64,
        token: &CreateImpersonationToken,
    ) -> Result<ImpersonationToken> {
        self.post(&format!("users/{user_id}/impersonation_tokens"), token)
            .await
    }

    async fn revoke_impersonation_token(&self, user_id: u64, token_id: u64) -> Result<()> {
        let path = format!("users/{user_id}/impersonation_tokens/{token_id}");
        self.send(self.client.delete(self.url(&path)), &path).await?;
        Ok(())
    }

    fn impersonate(&self, token: SecretString) -> Result<Arc<dyn GitLabApi>> {
        let mut config = self.config.clone();
        config.token = Some(token);
        Ok(Arc::new(GitLabClient::new(&config)?))
    }
}

/// Numeric ids are used verbatim; `namespace/project` paths are URL-encoded
fn encode_project_id(project_id: &str) -> String {
    let trimmed = project_id.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        trimmed.to_string()
    } else {
        url::form_urlencoded::byte_serialize(trimmed.as_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gitlab::models::{IssueStateEvent, LifecycleState};
    use crate::config::secret_string;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> GitLabClient {
        let config = GitLabConfig {
            base_url: server.url(),
            token: Some(secret_string("glpat-test".to_string())),
            project_id: "7".to_string(),
            ..GitLabConfig::default()
        };
        GitLabClient::new(&config).unwrap()
    }

    #[test]
    fn test_project_path_encoding() {
        assert_eq!(encode_project_id("42"), "42");
        assert_eq!(encode_project_id("group/sub/app"), "group%2Fsub%2Fapp");
    }

    #[tokio::test]
    async fn test_sends_private_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/7")
            .match_header("private-token", "glpat-test")
            .with_status(200)
            .with_body(r#"{"id":7,"name":"app","path_with_namespace":"group/app"}"#)
            .create_async()
            .await;

        let project = client_for(&server).get_project().await.unwrap();
        assert_eq!(project.name, "app");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_issue_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v4/projects/7/issues/42")
            .with_status(404)
            .with_body(r#"{"message":"404 Not found"}"#)
            .create_async()
            .await;

        assert_eq!(client_for(&server).get_issue(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_follows_next_page_header() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/api/v4/projects/7/milestones")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("x-next-page", "2")
            .with_body(r#"[{"id":1,"title":"v1","state":"active"}]"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/v4/projects/7/milestones")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("x-next-page", "")
            .with_body(r#"[{"id":2,"title":"v2","state":"closed","due_date":"2025-07-24"}]"#)
            .create_async()
            .await;

        let milestones = client_for(&server).list_milestones().await.unwrap();
        assert_eq!(milestones.len(), 2);
        assert_eq!(milestones[1].state, LifecycleState::Closed);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_issue_sends_state_event_only() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v4/projects/7/issues/42")
            .match_body(Matcher::Json(serde_json::json!({"state_event": "close"})))
            .with_status(200)
            .with_body(r#"{"id":100,"iid":42,"title":"t","state":"closed"}"#)
            .create_async()
            .await;

        let update = UpdateIssue {
            state_event: Some(IssueStateEvent::Close),
            ..UpdateIssue::default()
        };
        let issue = client_for(&server).update_issue(42, &update).await.unwrap();
        assert!(issue.state.is_closed());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v4/user")
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).current_user().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::GitLab(GitLabError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_find_user_by_email_requires_exact_match() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v4/users")
            .match_query(Matcher::UrlEncoded("search".into(), "jane@example.org".into()))
            .with_status(200)
            .with_body(
                r#"[{"id":1,"username":"janet","email":"janet@example.org"},
                    {"id":2,"username":"jane","email":"jane@example.org"}]"#,
            )
            .create_async()
            .await;

        let user = client_for(&server)
            .find_user_by_email("jane@example.org")
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.id), Some(2));
    }
}
