//! Authentication module for the admin session.
//!
//! This module provides:
//! - `Authenticator`: remote-first login with a local allow-list fallback,
//!   session inspection, verification and logout
//! - `SessionRecord`: the identity persisted after login
//! - `Credentials` / `AllowList`: login input and fallback accounts
//!
//! Sessions live in an injected `SessionStore` and expire lazily: the
//! local policy rejects sessions older than 24 hours, checked only when
//! verification runs.

pub mod authenticator;
pub mod credentials;
pub mod session;

pub use authenticator::{AuthError, AuthResult, Authenticator, INVALID_CREDENTIALS_MESSAGE};
pub use credentials::{hash_password, AllowList, AllowedCredential, Credentials};
pub use session::SessionRecord;
