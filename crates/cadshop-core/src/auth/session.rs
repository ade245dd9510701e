use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to every session issued by the local fallback
pub const ADMIN_ROLE: &str = "admin";

/// Default session lifetime used by the local verification policy.
pub const DEFAULT_SESSION_MAX_AGE_HOURS: i64 = 24;

/// Store key for the authenticated flag
pub const AUTHENTICATED_KEY: &str = "admin_authenticated";

/// Store key for the serialized session record
pub const USER_KEY: &str = "admin_user";

/// Store key for the session token
pub const TOKEN_KEY: &str = "admin_token";

/// Value written under `AUTHENTICATED_KEY` while a session exists
pub const AUTHENTICATED_FLAG: &str = "true";

fn default_role() -> String {
    ADMIN_ROLE.to_string()
}

/// The authenticated identity persisted after login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub username: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "Utc::now")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub login_time: DateTime<Utc>,
}

impl SessionRecord {
    /// Admin record for `username`, logged in now
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: default_role(),
            login_time: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.login_time
    }

    /// A login time in the future counts as fresh.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }

    /// Never negative. An expiry past the representable range is
    /// treated as never expiring.
    pub fn time_until_expiry(&self, max_age: Duration) -> Duration {
        match self.login_time.checked_add_signed(max_age) {
            Some(expiry) => (expiry - Utc::now()).max(Duration::zero()),
            None => Duration::MAX,
        }
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, max_age: Duration) -> i64 {
        self.time_until_expiry(max_age).num_minutes().max(0)
    }
}

/// Opaque token for a locally issued session: the issue time in
/// milliseconds plus a random suffix.
pub fn local_token() -> String {
    format!(
        "local-{}-{:08x}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}
