//! Application configuration management.
//!
//! This module handles loading and saving the admin configuration: the
//! auth API location, session lifetime, session storage backend and the
//! fallback allow-list.
//!
//! Configuration is stored at `~/.config/cadshop-admin/config.json`.
//! A missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::api::{AuthApi, HttpAuthApi, OfflineApi};
use crate::auth::session::DEFAULT_SESSION_MAX_AGE_HOURS;
use crate::auth::{AllowList, Authenticator};
use crate::guard::{RouteGuard, DEFAULT_ENTRY_POINT};
use crate::store::{FileStore, KeyringStore, MemoryStore, SessionStore};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "cadshop-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_MAX_AGE_HOURS: i64 = 24 * 366;

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "CADSHOP_API_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_session_max_age_hours() -> i64 {
    DEFAULT_SESSION_MAX_AGE_HOURS
}

fn default_entry_point() -> String {
    DEFAULT_ENTRY_POINT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the auth API. Without one, only the allow-list is used.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_session_max_age_hours")]
    pub session_max_age_hours: i64,
    #[serde(default)]
    pub store: StoreBackend,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    #[serde(default = "AllowList::demo")]
    pub fallback_credentials: AllowList,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            session_max_age_hours: default_session_max_age_hours(),
            store: StoreBackend::default(),
            data_dir: None,
            entry_point: default_entry_point(),
            fallback_credentials: AllowList::demo(),
        }
    }
}

impl AppConfig {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Self = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            debug!(path = %path.display(), "Config loaded");
            Ok(config)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply environment overrides (`CADSHOP_API_URL`)
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.api_base_url = if url.trim().is_empty() { None } else { Some(url) };
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Reject values that would break the session policy or the HTTP client
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SESSION_MAX_AGE_HOURS).contains(&self.session_max_age_hours) {
            anyhow::bail!(
                "session_max_age_hours must be between 1 and {}, got {}",
                MAX_SESSION_MAX_AGE_HOURS,
                self.session_max_age_hours
            );
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn session_max_age(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_hours(self.session_max_age_hours).ok_or_else(|| {
            anyhow::anyhow!(
                "session_max_age_hours out of range: {}",
                self.session_max_age_hours
            )
        })
    }

    pub fn build_store(&self) -> Result<Arc<dyn SessionStore>> {
        Ok(match self.store {
            StoreBackend::File => Arc::new(FileStore::new(self.data_dir()?)),
            StoreBackend::Keyring => Arc::new(KeyringStore::new(APP_NAME)),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }

    pub fn build_api(&self) -> Result<Arc<dyn AuthApi>> {
        match self.api_base_url {
            Some(ref url) => {
                let api = HttpAuthApi::new(url.as_str(), Duration::from_secs(self.request_timeout_secs))
                    .context("Failed to build HTTP client")?;
                Ok(Arc::new(api))
            }
            None => Ok(Arc::new(OfflineApi)),
        }
    }

    pub fn build_authenticator(&self) -> Result<Authenticator> {
        self.validate()?;
        Ok(Authenticator::new(
            self.build_store()?,
            self.build_api()?,
            self.fallback_credentials.clone(),
        )
        .with_max_age(self.session_max_age()?))
    }

    pub fn build_guard(&self, authenticator: Arc<Authenticator>) -> RouteGuard {
        RouteGuard::new(authenticator).with_entry_point(self.entry_point.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AllowedCredential, Credentials};

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, None);
        assert_eq!(config.session_max_age_hours, 24);
        assert_eq!(config.store, StoreBackend::File);
        assert_eq!(config.entry_point, "/");
        assert_eq!(config.fallback_credentials, AllowList::demo());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{"api_base_url":"http://localhost:4000/api","store":"memory"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:4000/api"));
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.fallback_credentials.entries().len(), 3);
    }

    #[test]
    fn test_empty_allow_list_disables_fallback() {
        let json = r#"{"fallback_credentials":[]}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.fallback_credentials.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.session_max_age_hours = 8;
        config.fallback_credentials = AllowList::new(vec![AllowedCredential::plain("ops", "pw")]);
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.session_max_age_hours, 8);
        assert_eq!(loaded.fallback_credentials, config.fallback_credentials);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.entry_point, "/");
    }

    #[test]
    fn test_load_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_out_of_range_max_age_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        for hours in ["9000000000000", "-1", "0"] {
            std::fs::write(&path, format!(r#"{{"session_max_age_hours": {}}}"#, hours)).unwrap();
            let err = AppConfig::load_from(&path).unwrap_err();
            assert!(format!("{:#}", err).contains("session_max_age_hours"), "{}", hours);
        }
    }

    #[test]
    fn test_out_of_range_max_age_never_panics() {
        let config = AppConfig {
            session_max_age_hours: 9_000_000_000_000,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(config.session_max_age().is_err());
        assert!(config.build_authenticator().is_err());

        let config = AppConfig {
            store: StoreBackend::Memory,
            ..AppConfig::default()
        };
        assert_eq!(config.session_max_age().unwrap(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_build_authenticator_offline_with_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        };

        let auth = config.build_authenticator().unwrap();
        assert!(auth.authenticate(&Credentials::new("admin", "admin123")).await.success);

        // A second authenticator over the same directory sees the session
        let reopened = config.build_authenticator().unwrap();
        assert!(reopened.is_authenticated());
        assert!(reopened.verify_session().await.unwrap());
    }
}
