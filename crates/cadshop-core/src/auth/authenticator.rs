use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::credentials::{AllowList, Credentials};
use super::session::{
    local_token, SessionRecord, AUTHENTICATED_FLAG, AUTHENTICATED_KEY,
    DEFAULT_SESSION_MAX_AGE_HOURS, TOKEN_KEY, USER_KEY,
};
use crate::api::{ApiError, AuthApi, RemoteOutcome};
use crate::store::{SessionStore, StoreError};

/// Message returned when neither the remote nor the allow-list accepts
/// the credentials
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Session store failed: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResult {
    pub fn succeeded(user: SessionRecord, token: String) -> Self {
        Self {
            success: true,
            user: Some(user),
            token: Some(token),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            token: None,
            message: Some(message.into()),
        }
    }
}

/// Raw stored session, read as a group.
#[derive(Debug, Clone)]
struct StoredSession {
    user: String,
    token: String,
}

/// Issues, inspects, verifies and clears the admin session.
///
/// Login tries the remote API first and falls back to the configured
/// allow-list. Verification tries the remote API first and falls back to
/// the session age.
pub struct Authenticator {
    store: Arc<dyn SessionStore>,
    api: Arc<dyn AuthApi>,
    allow_list: AllowList,
    max_age: Duration,
}

impl Authenticator {
    pub fn new(store: Arc<dyn SessionStore>, api: Arc<dyn AuthApi>, allow_list: AllowList) -> Self {
        Self {
            store,
            api,
            allow_list,
            max_age: Duration::hours(DEFAULT_SESSION_MAX_AGE_HOURS),
        }
    }

    /// Override the session lifetime used by the local verification policy
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Authenticate, remote first, then against the allow-list.
    ///
    /// Remote errors are logged and never returned. The session is
    /// persisted only on success.
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult {
        match self.api.login(credentials).await {
            RemoteOutcome::Answered(session) => {
                let user = session
                    .user
                    .unwrap_or_else(|| SessionRecord::admin(&credentials.username));
                info!(username = %user.username, "Remote login succeeded");
                return self.issue(user, session.token);
            }
            RemoteOutcome::Rejected(reason) => {
                warn!(username = %credentials.username, %reason, "Remote login rejected, trying fallback credentials");
            }
            RemoteOutcome::Unavailable(ApiError::NotConfigured) => {
                debug!("No auth API configured, using fallback credentials");
            }
            RemoteOutcome::Unavailable(e) => {
                warn!(error = %e, "Auth API unavailable, trying fallback credentials");
            }
        }

        if self.allow_list.matches(credentials) {
            info!(username = %credentials.username, "Fallback login succeeded");
            return self.issue(SessionRecord::admin(&credentials.username), local_token());
        }

        info!(username = %credentials.username, "Login failed");
        AuthResult::failed(INVALID_CREDENTIALS_MESSAGE)
    }

    fn issue(&self, user: SessionRecord, token: String) -> AuthResult {
        match self.persist(&user, &token) {
            Ok(()) => AuthResult::succeeded(user, token),
            Err(e) => {
                warn!(error = %e, "Failed to persist session");
                AuthResult::failed(format!("Could not save session: {}", e))
            }
        }
    }

    /// Write the session as a group, flag last. Any failure removes
    /// whatever was already written.
    fn persist(&self, user: &SessionRecord, token: &str) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(user)?;
        let result = self
            .store
            .set(USER_KEY, &serialized)
            .and_then(|_| self.store.set(TOKEN_KEY, token))
            .and_then(|_| self.store.set(AUTHENTICATED_KEY, AUTHENTICATED_FLAG));

        if result.is_err() {
            self.logout();
        }
        result
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    fn stored_session(&self) -> Result<Option<StoredSession>, StoreError> {
        let flag = self.store.get(AUTHENTICATED_KEY)?;
        if flag.as_deref() != Some(AUTHENTICATED_FLAG) {
            return Ok(None);
        }
        let user = self.store.get(USER_KEY)?;
        let token = self.store.get(TOKEN_KEY)?;
        Ok(match (user, token) {
            (Some(user), Some(token)) => Some(StoredSession { user, token }),
            _ => None,
        })
    }

    /// True iff the flag, the user and the token are all stored.
    /// Does not check expiry.
    pub fn is_authenticated(&self) -> bool {
        match self.stored_session() {
            Ok(session) => session.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read session, treating as logged out");
                false
            }
        }
    }

    /// Stored user record, or `None` if absent or unreadable
    pub fn current_user(&self) -> Option<SessionRecord> {
        let raw = match self.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Stored user record is malformed");
                None
            }
        }
    }

    /// Stored session token, if a session exists
    pub fn session_token(&self) -> Option<String> {
        self.stored_session().ok().flatten().map(|s| s.token)
    }

    /// Remove every session key. Safe to call without a session.
    pub fn logout(&self) {
        for key in [AUTHENTICATED_KEY, USER_KEY, TOKEN_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to clear session key");
            }
        }
        debug!("Session cleared");
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Check the stored session, remote first, then by age.
    ///
    /// Returns `Ok(false)` without a network call when there is no session.
    /// Never clears the session; callers decide whether to log out.
    /// Errors only on store failure.
    pub async fn verify_session(&self) -> Result<bool, AuthError> {
        let Some(session) = self.stored_session()? else {
            debug!("No stored session to verify");
            return Ok(false);
        };

        match self.api.verify(&session.token).await {
            RemoteOutcome::Answered(valid) => {
                debug!(valid, "Remote verification answered");
                return Ok(valid);
            }
            RemoteOutcome::Rejected(reason) => {
                warn!(%reason, "Remote verification refused, checking session age");
            }
            RemoteOutcome::Unavailable(ApiError::NotConfigured) => {
                debug!("No auth API configured, checking session age");
            }
            RemoteOutcome::Unavailable(e) => {
                warn!(error = %e, "Auth API unavailable, checking session age");
            }
        }

        Ok(self.verify_locally(&session))
    }

    fn verify_locally(&self, session: &StoredSession) -> bool {
        match serde_json::from_str::<SessionRecord>(&session.user) {
            Ok(user) => {
                let valid = !user.is_expired(self.max_age);
                debug!(valid, age_minutes = user.age().num_minutes(), "Local session check");
                valid
            }
            Err(e) => {
                debug!(error = %e, "Stored user record is malformed");
                false
            }
        }
    }
}
