//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{ApiError, AuthApi, RemoteOutcome, RemoteSession};
use crate::auth::Credentials;
use crate::store::{MemoryStore, SessionStore, StoreError};

fn unreachable_error() -> ApiError {
    ApiError::ServerError {
        status: 503,
        body: "scripted outage".to_string(),
    }
}

/// `AuthApi` double. Each scripted outcome is used once; unscripted
/// calls are `Unavailable`.
#[derive(Default)]
pub struct ScriptedApi {
    login: Mutex<Option<RemoteOutcome<RemoteSession>>>,
    verify: Mutex<Option<RemoteOutcome<bool>>>,
    login_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    last_verify_token: Mutex<Option<String>>,
}

impl ScriptedApi {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_login(&self, outcome: RemoteOutcome<RemoteSession>) {
        *self.login.lock() = Some(outcome);
    }

    pub fn set_verify(&self, outcome: RemoteOutcome<bool>) {
        *self.verify.lock() = Some(outcome);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn last_verify_token(&self) -> Option<String> {
        self.last_verify_token.lock().clone()
    }
}

#[async_trait]
impl AuthApi for ScriptedApi {
    async fn login(&self, _credentials: &Credentials) -> RemoteOutcome<RemoteSession> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login
            .lock()
            .take()
            .unwrap_or_else(|| RemoteOutcome::Unavailable(unreachable_error()))
    }

    async fn verify(&self, token: &str) -> RemoteOutcome<bool> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_verify_token.lock() = Some(token.to_string());
        self.verify
            .lock()
            .take()
            .unwrap_or_else(|| RemoteOutcome::Unavailable(unreachable_error()))
    }
}

/// Store that fails reads, or writes after a number of successful ones.
pub struct FailingStore {
    inner: MemoryStore,
    fail_get: bool,
    sets_before_failure: Option<usize>,
    sets: AtomicUsize,
}

impl FailingStore {
    pub fn failing_get() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_get: true,
            sets_before_failure: None,
            sets: AtomicUsize::new(0),
        }
    }

    pub fn failing_set_after(successful_sets: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_get: false,
            sets_before_failure: Some(successful_sets),
            sets: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn io_error() -> StoreError {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable"))
    }
}

impl SessionStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_get {
            return Err(Self::io_error());
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let done = self.sets.fetch_add(1, Ordering::SeqCst);
        if matches!(self.sets_before_failure, Some(limit) if done >= limit) {
            return Err(Self::io_error());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}
