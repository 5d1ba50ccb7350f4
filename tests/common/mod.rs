//! Shared fakes for integration tests
//!
//! - [`FakeTrac`]: scripted XML-RPC transport
//! - [`FakeGitLab`]: in-memory GitLab project recording every write

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trac2gitlab::adapters::gitlab::{
    CreateImpersonationToken, CreateIssue, CreateMilestone, CreateUser, GitLabApi,
    ImpersonationToken, Issue, IssueStateEvent, LifecycleState, Milestone, MilestoneStateEvent,
    Project, UpdateIssue, UpdateMilestone, User, VersionInfo,
};
use trac2gitlab::adapters::trac::{RpcTransport, RpcValue, TracClient};
use trac2gitlab::config::SecretString;
use trac2gitlab::domain::{Attributes, GitLabError, Result, Ticket, TracError};

// ---- Trac ----

enum Reply {
    Value(RpcValue),
    Fault(String),
    Unreachable,
}

/// Transport answering from a table keyed by method and parameters
#[derive(Default)]
pub struct FakeTrac {
    replies: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

fn call_key(method: &str, params: &[RpcValue]) -> String {
    let params: Vec<String> = params
        .iter()
        .map(|p| match p {
            RpcValue::String(s) => s.clone(),
            RpcValue::Int(i) => i.to_string(),
            other => format!("{other:?}"),
        })
        .collect();
    format!("{method}({})", params.join(","))
}

impl FakeTrac {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, params: &[RpcValue], value: RpcValue) {
        self.replies
            .lock()
            .unwrap()
            .insert(call_key(method, params), Reply::Value(value));
    }

    pub fn fault(&self, method: &str, params: &[RpcValue], message: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(call_key(method, params), Reply::Fault(message.to_string()));
    }

    pub fn unreachable(&self, method: &str, params: &[RpcValue]) {
        self.replies
            .lock()
            .unwrap()
            .insert(call_key(method, params), Reply::Unreachable);
    }

    /// Holds the reply to one call back for `delay`
    pub fn delay(&self, method: &str, params: &[RpcValue], delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(call_key(method, params), delay);
    }

    /// Every call made so far, as `method(params)`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn client(self: &Arc<Self>) -> TracClient {
        TracClient::with_transport(self.clone())
    }

    /// Scripts `ticket.get`, an empty change log and the given attachments
    pub fn add_ticket(&self, id: i64, summary: &str, status: &str, attachments: &[&str]) {
        let id_param = [RpcValue::Int(id)];
        self.on(
            "ticket.get",
            &id_param,
            RpcValue::Array(vec![
                RpcValue::Int(id),
                RpcValue::Int(1_600_000_000),
                RpcValue::Int(1_600_000_500),
                strukt(&[
                    ("summary", RpcValue::from(summary)),
                    ("status", RpcValue::from(status)),
                    ("reporter", RpcValue::from("alice")),
                    ("description", RpcValue::from("")),
                ]),
            ]),
        );
        self.on("ticket.changeLog", &id_param, RpcValue::Array(vec![]));
        self.on(
            "ticket.listAttachments",
            &id_param,
            RpcValue::Array(
                attachments
                    .iter()
                    .map(|name| {
                        RpcValue::Array(vec![
                            RpcValue::from(*name),
                            RpcValue::from(""),
                            RpcValue::Int(4),
                            RpcValue::Int(1_600_000_100),
                            RpcValue::from("alice"),
                        ])
                    })
                    .collect(),
            ),
        );
    }

    /// Scripts a wiki page whose every version has text `"v<N> of <name>"`
    pub fn add_wiki_page(&self, name: &str, versions: i64) {
        let page = [RpcValue::from(name)];
        self.on("wiki.getPageInfo", &page, page_info(name, versions));
        for version in 1..=versions {
            let params = [RpcValue::from(name), RpcValue::Int(version)];
            self.on(
                "wiki.getPageVersion",
                &params,
                RpcValue::from(format!("v{version} of {name}")),
            );
            self.on("wiki.getPageInfoVersion", &params, page_info(name, version));
        }
        self.on("wiki.listAttachments", &page, RpcValue::Array(vec![]));
    }
}

#[async_trait]
impl RpcTransport for FakeTrac {
    async fn call(&self, method: &str, params: Vec<RpcValue>) -> Result<RpcValue> {
        let key = call_key(method, &params);
        self.calls.lock().unwrap().push(key.clone());
        // Yield so concurrent callers interleave
        tokio::task::yield_now().await;
        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let replies = self.replies.lock().unwrap();
        match replies.get(&key) {
            Some(Reply::Value(value)) => Ok(value.clone()),
            Some(Reply::Fault(message)) => Err(TracError::Fault {
                code: 1,
                message: message.clone(),
            }
            .into()),
            Some(Reply::Unreachable) => {
                Err(TracError::ConnectionFailed(format!("{key}: connection refused")).into())
            }
            None => Err(TracError::Fault {
                code: 2,
                message: format!("unscripted call {key}"),
            }
            .into()),
        }
    }
}

pub fn strukt(members: &[(&str, RpcValue)]) -> RpcValue {
    RpcValue::Struct(
        members
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn page_info(name: &str, version: i64) -> RpcValue {
    strukt(&[
        ("name", RpcValue::from(name)),
        ("version", RpcValue::Int(version)),
        ("author", RpcValue::from("alice")),
        ("lastModified", RpcValue::Int(1_600_000_000 + version)),
    ])
}

// ---- domain records ----

pub fn ticket(id: i64, summary: &str, status: &str, milestone: &str) -> Ticket {
    let mut attributes = Attributes::new();
    attributes.insert("summary".to_string(), summary.into());
    attributes.insert("status".to_string(), status.into());
    attributes.insert("milestone".to_string(), milestone.into());
    attributes.insert("reporter".to_string(), "alice@example.org".into());
    let mut ticket = Ticket::new(id, attributes);
    ticket.time_created = Utc.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).single();
    ticket.time_changed = Utc.with_ymd_and_hms(2020, 2, 1, 9, 0, 0).single();
    ticket
}

// ---- GitLab ----

/// A write sent to the fake project
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    CreateMilestone(CreateMilestone),
    UpdateMilestone(u64, UpdateMilestone),
    /// `as_user` is the impersonated user id, `None` for the admin client
    CreateIssue {
        as_user: Option<u64>,
        issue: CreateIssue,
    },
    UpdateIssue {
        as_user: Option<u64>,
        iid: i64,
        update: UpdateIssue,
    },
    CreateUser(String),
    CreateToken(u64),
    RevokeToken(u64, u64),
}

#[derive(Default)]
struct ProjectState {
    next_id: u64,
    milestones: Vec<Milestone>,
    issues: BTreeMap<i64, Issue>,
    users: Vec<User>,
    tokens: Vec<(u64, ImpersonationToken)>,
    writes: Vec<Write>,
    failing_iids: Vec<i64>,
}

impl ProjectState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory GitLab project
#[derive(Clone, Default)]
pub struct FakeGitLab {
    state: Arc<Mutex<ProjectState>>,
    as_user: Option<u64>,
}

impl FakeGitLab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    pub fn issue(&self, iid: i64) -> Option<Issue> {
        self.state.lock().unwrap().issues.get(&iid).cloned()
    }

    pub fn milestones(&self) -> Vec<Milestone> {
        self.state.lock().unwrap().milestones.clone()
    }

    /// `get_issue` for `iid` fails with a server error
    pub fn fail_issue(&self, iid: i64) {
        self.state.lock().unwrap().failing_iids.push(iid);
    }

    pub fn add_user(&self, username: &str, email: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.users.push(User {
            id,
            username: username.to_string(),
            name: username.to_string(),
            email: Some(email.to_string()),
            public_email: None,
            is_admin: false,
        });
        id
    }

    pub fn add_milestone(&self, title: &str, closed: bool) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.milestones.push(Milestone {
            id,
            title: title.to_string(),
            description: None,
            state: LifecycleState::from_closed(closed),
            due_date: None,
        });
        id
    }

    pub fn add_issue(&self, iid: i64, title: &str, closed: bool) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.issues.insert(
            iid,
            Issue {
                id,
                iid,
                title: title.to_string(),
                description: None,
                state: LifecycleState::from_closed(closed),
                milestone: None,
                updated_at: None,
                web_url: format!("https://gitlab.example.com/group/project/-/issues/{iid}"),
            },
        );
    }

    /// Live (unrevoked) impersonation tokens
    pub fn live_tokens(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .tokens
            .iter()
            .filter(|(_, t)| !t.revoked)
            .count()
    }
}

#[async_trait]
impl GitLabApi for FakeGitLab {
    async fn get_project(&self) -> Result<Project> {
        Ok(Project {
            id: 1,
            name: "project".to_string(),
            path_with_namespace: "group/project".to_string(),
            web_url: "https://gitlab.example.com/group/project".to_string(),
        })
    }

    async fn version(&self) -> Result<VersionInfo> {
        Ok(VersionInfo {
            version: "16.0.0".to_string(),
            revision: "fake".to_string(),
        })
    }

    async fn current_user(&self) -> Result<User> {
        Ok(User {
            id: 0,
            username: "root".to_string(),
            name: "Administrator".to_string(),
            email: None,
            public_email: None,
            is_admin: true,
        })
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>> {
        Ok(self.milestones())
    }

    async fn create_milestone(&self, milestone: &CreateMilestone) -> Result<Milestone> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::CreateMilestone(milestone.clone()));
        let id = state.next_id();
        let created = Milestone {
            id,
            title: milestone.title.clone(),
            description: milestone.description.clone(),
            state: LifecycleState::Open,
            due_date: milestone.due_date,
        };
        state.milestones.push(created.clone());
        Ok(created)
    }

    async fn update_milestone(
        &self,
        milestone_id: u64,
        update: &UpdateMilestone,
    ) -> Result<Milestone> {
        let mut state = self.state.lock().unwrap();
        state
            .writes
            .push(Write::UpdateMilestone(milestone_id, update.clone()));
        let milestone = state
            .milestones
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| GitLabError::NotFound(format!("milestone {milestone_id}")))?;
        if let Some(description) = &update.description {
            milestone.description = Some(description.clone());
        }
        if let Some(due_date) = update.due_date {
            milestone.due_date = Some(due_date);
        }
        match update.state_event {
            Some(MilestoneStateEvent::Close) => milestone.state = LifecycleState::Closed,
            Some(MilestoneStateEvent::Activate) => milestone.state = LifecycleState::Open,
            None => {}
        }
        Ok(milestone.clone())
    }

    async fn get_issue(&self, iid: i64) -> Result<Option<Issue>> {
        let state = self.state.lock().unwrap();
        if state.failing_iids.contains(&iid) {
            return Err(GitLabError::ServerError {
                status: 500,
                message: format!("issue {iid} unavailable"),
            }
            .into());
        }
        Ok(state.issues.get(&iid).cloned())
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.state.lock().unwrap().issues.values().cloned().collect())
    }

    async fn create_issue(&self, issue: &CreateIssue) -> Result<Issue> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::CreateIssue {
            as_user: self.as_user,
            issue: issue.clone(),
        });
        if state.issues.contains_key(&issue.iid) {
            return Err(GitLabError::ClientError {
                status: 409,
                message: format!("iid {} already taken", issue.iid),
            }
            .into());
        }
        let milestone = issue
            .milestone_id
            .and_then(|id| state.milestones.iter().find(|m| m.id == id).cloned());
        let id = state.next_id();
        let created = Issue {
            id,
            iid: issue.iid,
            title: issue.title.clone(),
            description: issue.description.clone(),
            state: LifecycleState::Open,
            milestone,
            updated_at: issue.created_at,
            web_url: format!("https://gitlab.example.com/group/project/-/issues/{}", issue.iid),
        };
        state.issues.insert(issue.iid, created.clone());
        Ok(created)
    }

    async fn update_issue(&self, iid: i64, update: &UpdateIssue) -> Result<Issue> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::UpdateIssue {
            as_user: self.as_user,
            iid,
            update: update.clone(),
        });
        let milestone = match update.milestone_id {
            Some(0) => Some(None),
            Some(id) => Some(state.milestones.iter().find(|m| m.id == id).cloned()),
            None => None,
        };
        let issue = state
            .issues
            .get_mut(&iid)
            .ok_or_else(|| GitLabError::NotFound(format!("issue {iid}")))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(description) = &update.description {
            issue.description = Some(description.clone());
        }
        if let Some(milestone) = milestone {
            issue.milestone = milestone;
        }
        match update.state_event {
            Some(IssueStateEvent::Close) => issue.state = LifecycleState::Closed,
            Some(IssueStateEvent::Reopen) => issue.state = LifecycleState::Open,
            None => {}
        }
        if update.updated_at.is_some() {
            issue.updated_at = update.updated_at;
        }
        Ok(issue.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.has_email(email)).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::CreateUser(user.email.clone()));
        let id = state.next_id();
        let created = User {
            id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
            public_email: None,
            is_admin: false,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn list_impersonation_tokens(&self, user_id: u64) -> Result<Vec<ImpersonationToken>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tokens
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, t)| ImpersonationToken {
                token: None,
                ..t.clone()
            })
            .collect())
    }

    async fn create_impersonation_token(
        &self,
        user_id: u64,
        token: &CreateImpersonationToken,
    ) -> Result<ImpersonationToken> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::CreateToken(user_id));
        let id = state.next_id();
        let created = ImpersonationToken {
            id,
            name: token.name.clone(),
            token: Some(format!("user-{user_id}")),
            revoked: false,
            active: true,
            scopes: token.scopes.clone(),
        };
        state.tokens.push((user_id, created.clone()));
        Ok(created)
    }

    async fn revoke_impersonation_token(&self, user_id: u64, token_id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(Write::RevokeToken(user_id, token_id));
        let (_, token) = state
            .tokens
            .iter_mut()
            .find(|(owner, t)| *owner == user_id && t.id == token_id)
            .ok_or_else(|| GitLabError::NotFound(format!("token {token_id}")))?;
        token.revoked = true;
        token.active = false;
        Ok(())
    }

    fn impersonate(&self, token: SecretString) -> Result<Arc<dyn GitLabApi>> {
        use secrecy::ExposeSecret;

        let secret: &str = token.expose_secret().as_ref();
        let user_id = secret
            .strip_prefix("user-")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| GitLabError::AuthenticationFailed("unknown token".to_string()))?;
        Ok(Arc::new(FakeGitLab {
            state: Arc::clone(&self.state),
            as_user: Some(user_id),
        }))
    }
}
