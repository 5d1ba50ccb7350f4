//! Impersonation sessions
//!
//! Issues are created as their Trac reporter by acting with a short-lived
//! impersonation token of the matching GitLab user. [`UserSessionCache`]
//! keeps one impersonated client per reporter for the duration of one
//! import run and revokes every token it issued at the end.

use super::api::GitLabApi;
use super::models::{CreateImpersonationToken, CreateUser, ImpersonationToken, User};
use crate::config::secret_string;
use crate::domain::{GitLabError, Result};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const TOKEN_SCOPES: [&str; 1] = ["api"];
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// An impersonated client and the token backing it
#[derive(Clone)]
pub struct UserSession {
    pub user_id: u64,
    pub token_id: u64,
    pub client: Arc<dyn GitLabApi>,
}

/// Reporter identity to session map
///
/// Keys are the reporter as recorded in Trac: an email address or a
/// username. Entries are never evicted.
pub struct UserSessionCache {
    sessions: Mutex<HashMap<String, UserSession>>,
    token_name: String,
    create_users: bool,
}

impl UserSessionCache {
    pub fn new(token_name: impl Into<String>, create_users: bool) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            token_name: token_name.into(),
            create_users,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Returns the cached client for `identity`, creating the session first
    /// if needed
    ///
    /// The lock is held while a session is created so one identity never
    /// gets two tokens.
    ///
    /// # Errors
    ///
    /// `GitLabError::UserNotFound` when no user matches and user creation is
    /// disabled, or any error from the token calls.
    pub async fn client_for(
        &self,
        admin: &dyn GitLabApi,
        identity: &str,
    ) -> Result<Arc<dyn GitLabApi>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(identity) {
            tracing::debug!(identity, "Using cached impersonated client");
            return Ok(session.client.clone());
        }

        let user = self.resolve_user(admin, identity).await?;
        let token = ensure_impersonation_token(admin, user.id, &self.token_name).await?;
        let secret = token.token.clone().ok_or_else(|| {
            GitLabError::InvalidResponse(format!(
                "impersonation token for user {} has no token value",
                user.id
            ))
        })?;
        let client = admin.impersonate(secret_string(secret))?;

        tracing::info!(identity, user_id = user.id, "Impersonation session started");
        sessions.insert(
            identity.to_string(),
            UserSession {
                user_id: user.id,
                token_id: token.id,
                client: client.clone(),
            },
        );
        Ok(client)
    }

    async fn resolve_user(&self, admin: &dyn GitLabApi, identity: &str) -> Result<User> {
        let is_email = identity.contains('@');
        let found = if is_email {
            admin.find_user_by_email(identity).await?
        } else {
            admin.find_user_by_username(identity).await?
        };

        match found {
            Some(user) => Ok(user),
            None if self.create_users && is_email => {
                tracing::info!(email = identity, "Creating missing GitLab user");
                admin.create_user(&CreateUser::from_email(identity)).await
            }
            None => Err(GitLabError::UserNotFound(identity.to_string()).into()),
        }
    }

    /// Revokes every issued token and empties the cache
    ///
    /// Failures are logged; returns the number of tokens revoked.
    pub async fn revoke_all(&self, admin: &dyn GitLabApi) -> usize {
        let mut sessions = self.sessions.lock().await;
        let mut revoked = 0;
        for (identity, session) in sessions.drain() {
            match admin
                .revoke_impersonation_token(session.user_id, session.token_id)
                .await
            {
                Ok(()) => revoked += 1,
                Err(e) => tracing::warn!(
                    identity = %identity,
                    user_id = session.user_id,
                    error = %e,
                    "Failed to revoke impersonation token"
                ),
            }
        }
        revoked
    }
}

/// Revokes live tokens named `name` for the user, then issues a fresh one
pub async fn ensure_impersonation_token(
    admin: &dyn GitLabApi,
    user_id: u64,
    name: &str,
) -> Result<ImpersonationToken> {
    for existing in admin.list_impersonation_tokens(user_id).await? {
        if existing.name == name && !existing.revoked {
            tracing::debug!(user_id, token_id = existing.id, "Revoking stale impersonation token");
            admin
                .revoke_impersonation_token(user_id, existing.id)
                .await?;
        }
    }

    let request = CreateImpersonationToken {
        name: name.to_string(),
        scopes: TOKEN_SCOPES.iter().map(|s| s.to_string()).collect(),
        expires_at: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).date_naive(),
    };
    admin.create_impersonation_token(user_id, &request).await
}
