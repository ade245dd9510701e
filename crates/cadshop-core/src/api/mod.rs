//! Remote auth API module.
//!
//! This module provides the `AuthApi` seam the authenticator talks to,
//! the `HttpAuthApi` client for the admin login/verify endpoints, and
//! `OfflineApi` for deployments with no backend.
//!
//! Remote calls never fail with an error. They resolve to a
//! `RemoteOutcome` so the caller's fallback decision is an explicit branch.

pub mod client;
pub mod error;

pub use client::{HttpAuthApi, OfflineApi};
pub use error::ApiError;

use async_trait::async_trait;

use crate::auth::{Credentials, SessionRecord};

/// Result of a remote auth call.
#[derive(Debug)]
pub enum RemoteOutcome<T> {
    /// The remote gave a definitive answer
    Answered(T),
    /// The remote refused (bad credentials, `success: false`, 401/403)
    Rejected(String),
    /// The remote could not be reached or did not answer usefully
    Unavailable(ApiError),
}

impl<T> RemoteOutcome<T> {
    pub fn is_answered(&self) -> bool {
        matches!(self, RemoteOutcome::Answered(_))
    }

    /// Classify a transport-level result: explicit refusals become
    /// `Rejected`, everything else `Unavailable`.
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => RemoteOutcome::Answered(value),
            Err(e) if e.is_rejection() => RemoteOutcome::Rejected(e.to_string()),
            Err(e) => RemoteOutcome::Unavailable(e),
        }
    }
}

/// Session issued by the remote login endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSession {
    pub user: Option<SessionRecord>,
    pub token: String,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session
    async fn login(&self, credentials: &Credentials) -> RemoteOutcome<RemoteSession>;

    /// Ask the remote whether a token is still valid
    async fn verify(&self, token: &str) -> RemoteOutcome<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_outcome_from_result() {
        let ok: RemoteOutcome<bool> = RemoteOutcome::from_result(Ok(true));
        assert!(matches!(ok, RemoteOutcome::Answered(true)));

        let rejected: RemoteOutcome<bool> = RemoteOutcome::from_result(Err(ApiError::Unauthorized));
        assert!(matches!(rejected, RemoteOutcome::Rejected(_)));

        let down: RemoteOutcome<bool> =
            RemoteOutcome::from_result(Err(ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "boom")));
        assert!(matches!(down, RemoteOutcome::Unavailable(ApiError::ServerError { status: 502, .. })));
        assert!(!down.is_answered());

        // Statuses the auth endpoints don't define are not a verdict
        let odd: RemoteOutcome<bool> =
            RemoteOutcome::from_result(Err(ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "")));
        assert!(matches!(odd, RemoteOutcome::Unavailable(ApiError::UnexpectedStatus { status: 404, .. })));
    }
}
