//! Route guard for protected admin views.
//!
//! A guard starts in `Checking`, runs one session check, and settles in
//! `Authenticated` or `Unauthenticated`. While checking, callers render a
//! loading placeholder. Once settled they render the protected content or
//! redirect to the public entry point.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::{AuthError, Authenticator};

/// Default public entry point unauthenticated visitors are sent to
pub const DEFAULT_ENTRY_POINT: &str = "/";

/// The session operations a guard needs.
#[async_trait]
pub trait SessionGate: Send + Sync {
    fn is_authenticated(&self) -> bool;

    async fn verify_session(&self) -> Result<bool, AuthError>;

    fn logout(&self);
}

#[async_trait]
impl SessionGate for Authenticator {
    fn is_authenticated(&self) -> bool {
        Authenticator::is_authenticated(self)
    }

    async fn verify_session(&self) -> Result<bool, AuthError> {
        Authenticator::verify_session(self).await
    }

    fn logout(&self) {
        Authenticator::logout(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authenticated,
    Unauthenticated,
}

impl GuardState {
    pub fn is_settled(self) -> bool {
        !matches!(self, GuardState::Checking)
    }
}

/// What a guarded view should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView<T> {
    Loading,
    Redirect(String),
    Content(T),
}

fn view_for<T>(state: GuardState, entry_point: &str, content: impl FnOnce() -> T) -> GuardView<T> {
    match state {
        GuardState::Checking => GuardView::Loading,
        GuardState::Authenticated => GuardView::Content(content()),
        GuardState::Unauthenticated => GuardView::Redirect(entry_point.to_string()),
    }
}

pub struct RouteGuard {
    gate: Arc<dyn SessionGate>,
    entry_point: String,
    state: GuardState,
}

impl RouteGuard {
    pub fn new(gate: Arc<dyn SessionGate>) -> Self {
        Self {
            gate,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            state: GuardState::Checking,
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Run the session check. Only the first call does any work; later
    /// calls return the settled state.
    pub async fn check(&mut self) -> GuardState {
        if self.state.is_settled() {
            return self.state;
        }

        self.state = if !self.gate.is_authenticated() {
            debug!("No session, redirecting");
            GuardState::Unauthenticated
        } else {
            match self.gate.verify_session().await {
                Ok(true) => GuardState::Authenticated,
                Ok(false) => {
                    debug!("Session failed verification, logging out");
                    self.gate.logout();
                    GuardState::Unauthenticated
                }
                Err(e) => {
                    warn!(error = %e, "Session verification errored, logging out");
                    self.gate.logout();
                    GuardState::Unauthenticated
                }
            }
        };
        self.state
    }

    /// `content` is only evaluated when the session was accepted.
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> GuardView<T> {
        view_for(self.state, &self.entry_point, content)
    }
}

/// A guard whose check runs in the background.
///
/// State is published on a watch channel so the caller can keep rendering
/// `Loading` while the check is in flight. Dropping the handle aborts the
/// check and discards its result.
pub struct MountedGuard {
    state: watch::Receiver<GuardState>,
    entry_point: String,
    task: JoinHandle<()>,
}

impl MountedGuard {
    /// Spawn the guard's check on the current tokio runtime.
    pub fn mount(mut guard: RouteGuard) -> Self {
        let (tx, rx) = watch::channel(guard.state());
        let entry_point = guard.entry_point().to_string();
        let task = tokio::spawn(async move {
            let state = guard.check().await;
            // Receiver gone means the view was unmounted
            let _ = tx.send(state);
        });
        Self {
            state: rx,
            entry_point,
            task,
        }
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    /// Wait for the check to settle.
    pub async fn settled(&mut self) -> GuardState {
        match self.state.wait_for(|state| state.is_settled()).await {
            Ok(state) => *state,
            // Check task ended without publishing; nothing to show
            Err(_) => GuardState::Unauthenticated,
        }
    }

    pub fn render<T>(&self, content: impl FnOnce() -> T) -> GuardView<T> {
        view_for(self.state(), &self.entry_point, content)
    }
}

impl Drop for MountedGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
