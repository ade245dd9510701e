//! Persistent key-value storage for session state.
//!
//! This module provides:
//! - `SessionStore`: the string-keyed, string-valued capability the
//!   authenticator is built on
//! - `MemoryStore`: process-local store, used in tests and ephemeral runs
//! - `FileStore`: JSON file in the data directory, survives restarts
//! - `KeyringStore`: OS keychain entries, one per key
//!
//! The store has no transactional guarantee. Grouping of the session keys
//! is handled by the authenticator.

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store contents: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] ::keyring::Error),
}

/// Key-value capability backing the session.
///
/// Implementations must treat `remove` of a missing key as a no-op.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
