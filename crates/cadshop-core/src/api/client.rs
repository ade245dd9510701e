//! HTTP client for the admin auth endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, AuthApi, RemoteOutcome, RemoteSession};
use crate::auth::{Credentials, SessionRecord};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, relative to the API base URL
const LOGIN_PATH: &str = "/admin/login";

/// Verify endpoint, relative to the API base URL
const VERIFY_PATH: &str = "/admin/verify";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(default)]
    success: bool,
    user: Option<SessionRecord>,
    token: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyReply {
    valid: bool,
}

impl LoginReply {
    fn into_outcome(self) -> RemoteOutcome<RemoteSession> {
        if !self.success {
            let message = self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Login rejected".to_string());
            return RemoteOutcome::Rejected(message);
        }
        match self.token {
            Some(token) if !token.is_empty() => RemoteOutcome::Answered(RemoteSession {
                user: self.user,
                token,
            }),
            _ => RemoteOutcome::Unavailable(ApiError::InvalidResponse(
                "Login succeeded without a token".to_string(),
            )),
        }
    }
}

/// Client for the admin auth API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn post_login(&self, credentials: &Credentials) -> Result<LoginReply, ApiError> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        debug!(%url, username = %credentials.username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))
    }

    async fn get_verify(&self, token: &str) -> Result<VerifyReply, ApiError> {
        let url = format!("{}{}", self.base_url, VERIFY_PATH);
        debug!(%url, "Sending verify request");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse verify response: {}", e)))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> RemoteOutcome<RemoteSession> {
        match RemoteOutcome::from_result(self.post_login(credentials).await) {
            RemoteOutcome::Answered(reply) => reply.into_outcome(),
            RemoteOutcome::Rejected(reason) => RemoteOutcome::Rejected(reason),
            RemoteOutcome::Unavailable(e) => RemoteOutcome::Unavailable(e),
        }
    }

    async fn verify(&self, token: &str) -> RemoteOutcome<bool> {
        RemoteOutcome::from_result(self.get_verify(token).await.map(|reply| reply.valid))
    }
}

/// Stand-in for a deployment without a backend. Every call is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineApi;

#[async_trait]
impl AuthApi for OfflineApi {
    async fn login(&self, _credentials: &Credentials) -> RemoteOutcome<RemoteSession> {
        RemoteOutcome::Unavailable(ApiError::NotConfigured)
    }

    async fn verify(&self, _token: &str) -> RemoteOutcome<bool> {
        RemoteOutcome::Unavailable(ApiError::NotConfigured)
    }
}
