use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Username/password pair supplied at login. Never persisted.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One entry of the fallback allow-list. Holds either a plaintext
/// password or an argon2 PHC hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedCredential {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl AllowedCredential {
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            password_hash: None,
        }
    }

    pub fn hashed(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            password_hash: Some(password_hash.into()),
        }
    }

    fn matches(&self, credentials: &Credentials) -> bool {
        if !constant_time_eq(&self.username, &credentials.username) {
            return false;
        }
        if let Some(ref hash) = self.password_hash {
            return verify_password_hash(hash, &credentials.password);
        }
        match self.password {
            Some(ref password) => constant_time_eq(password, &credentials.password),
            None => false,
        }
    }
}

/// Credentials accepted when the remote login is unavailable.
/// An empty list disables the fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList {
    entries: Vec<AllowedCredential>,
}

impl AllowList {
    pub fn new(entries: Vec<AllowedCredential>) -> Self {
        Self { entries }
    }

    /// The demo accounts shipped with the storefront.
    pub fn demo() -> Self {
        Self::new(vec![
            AllowedCredential::plain("admin", "admin123"),
            AllowedCredential::plain("manager", "manager123"),
            AllowedCredential::plain("demo", "demo123"),
        ])
    }

    pub fn entries(&self) -> &[AllowedCredential] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matches(&self, credentials: &Credentials) -> bool {
        self.entries.iter().any(|entry| entry.matches(credentials))
    }
}

/// Compare two strings in constant time (for equal-length inputs)
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn verify_password_hash(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed password hash in allow-list");
            false
        }
    }
}

/// Hash a password into an argon2 PHC string for the allow-list
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}
