use thiserror::Error;

/// Failure talking to the admin auth endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No auth API configured")]
    NotConfigured,

    /// 401: bad credentials or expired token
    #[error("Credentials or token rejected")]
    Unauthorized,

    /// 403: the account exists but may not use the admin panel
    #[error("Admin access denied: {0}")]
    Forbidden(String),

    #[error("Auth server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Characters of a response body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let kept: String = chars.by_ref().take(MAX_ERROR_BODY_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", kept)
    } else {
        kept
    }
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        match code {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(excerpt(body)),
            500..=599 => ApiError::ServerError {
                status: code,
                body: excerpt(body),
            },
            _ => ApiError::UnexpectedStatus {
                status: code,
                body: excerpt(body),
            },
        }
    }

    /// Whether the remote gave an explicit refusal, as opposed to being
    /// unreachable or misbehaving.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::FORBIDDEN, "no"), ApiError::Forbidden(_)));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError { status: 502, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::UnexpectedStatus { status: 404, .. }
        ));
    }

    #[test]
    fn test_is_rejection() {
        assert!(ApiError::Unauthorized.is_rejection());
        assert!(ApiError::Forbidden("x".into()).is_rejection());
        assert!(!ApiError::NotConfigured.is_rejection());
        assert!(!ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "").is_rejection());
    }

    #[test]
    fn test_long_bodies_are_cut() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        assert_eq!(excerpt(&long), format!("{}...", "x".repeat(MAX_ERROR_BODY_CHARS)));
        assert_eq!(excerpt("short"), "short");
    }
}
