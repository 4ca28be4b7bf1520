use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::identity::ProviderSession;
use super::storage::LocalStorage;
use crate::config::{Config, Platform};

const SERVICE_NAME: &str = "barberbook";

/// Storage keys, shared by every backend.
pub const TOKEN_KEY: &str = "token";
pub const UID_KEY: &str = "uid";
pub const REFRESH_KEY: &str = "refresh_token";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store is corrupt: {0}")]
    Corrupt(String),
}

impl From<keyring::Error> for StoreError {
    fn from(e: keyring::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Key-value store holding the credential.
///
/// `delete` of a key that is not present succeeds.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Bearer token and user id proving an authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub user_id: String,
    /// Long-lived provider token used to mint new bearer tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// Tokens stay out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Credential {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Both the token and the user id are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty() && !self.user_id.trim().is_empty()
    }

    /// Read the credential. A partial credential reads as `None`.
    pub async fn load(store: &dyn CredentialStore) -> Result<Option<Self>, StoreError> {
        let token = store.get(TOKEN_KEY).await?;
        let user_id = store.get(UID_KEY).await?;

        let (token, user_id) = match (token, user_id) {
            (Some(t), Some(u)) => (t, u),
            _ => return Ok(None),
        };

        let credential = Self {
            token,
            user_id,
            refresh_token: store.get(REFRESH_KEY).await?.filter(|r| !r.is_empty()),
        };
        Ok(credential.is_complete().then_some(credential))
    }

    pub async fn save(&self, store: &dyn CredentialStore) -> Result<(), StoreError> {
        store.set(TOKEN_KEY, &self.token).await?;
        store.set(UID_KEY, &self.user_id).await?;
        match self.refresh_token {
            Some(ref refresh) => store.set(REFRESH_KEY, refresh).await?,
            None => store.delete(REFRESH_KEY).await?,
        }
        Ok(())
    }

    /// Remove every credential key. Succeeds on an empty store.
    pub async fn clear(store: &dyn CredentialStore) -> Result<(), StoreError> {
        store.delete(TOKEN_KEY).await?;
        store.delete(UID_KEY).await?;
        store.delete(REFRESH_KEY).await?;
        Ok(())
    }
}

impl From<ProviderSession> for Credential {
    fn from(session: ProviderSession) -> Self {
        Credential::new(session.id_token, session.user_id)
            .with_refresh_token(session.refresh_token)
    }
}

/// OS keychain backed store (macOS/iOS Keychain, Windows Credential Manager,
/// Linux kernel keyring).
pub struct SecureStorage {
    service: String,
}

impl SecureStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key)?;
            op(entry)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
        .map_err(StoreError::from)
    }
}

impl Default for SecureStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for SecureStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.to_string();
        self.with_entry(key, move |entry| entry.set_password(&value))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        })
        .await
    }
}

/// Pick the backing store for the configured platform.
pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match config.platform {
        Platform::Native => Arc::new(SecureStorage::new()),
        Platform::Web => Arc::new(LocalStorage::new(config.cache_dir()?)),
    };
    debug!(platform = ?config.platform, "Credential store selected");
    Ok(store)
}
