//! Core library for the CadShop admin panel.
//!
//! Gates the administration views of the storefront behind a client-side
//! session:
//! - `store`: key-value persistence for the session (memory, file, keychain)
//! - `api`: HTTP client for the remote login/verify endpoints
//! - `auth`: the `Authenticator`, remote first with a local allow-list fallback
//! - `guard`: the route guard state machine for protected views
//! - `config`: configuration loading and wiring

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod store;

#[cfg(test)]
mod test_support;

pub use api::{ApiError, AuthApi, HttpAuthApi, OfflineApi, RemoteOutcome, RemoteSession};
pub use auth::{AllowList, AllowedCredential, AuthError, AuthResult, Authenticator, Credentials, SessionRecord};
pub use config::{AppConfig, StoreBackend};
pub use guard::{GuardState, GuardView, MountedGuard, RouteGuard, SessionGate};
pub use store::{FileStore, KeyringStore, MemoryStore, SessionStore, StoreError};
