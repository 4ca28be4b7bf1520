#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use barberbook_core::auth::{
    AuthFailure, Credential, CredentialStore, IdentityProvider, MemoryStore, ProviderSession,
    SessionContext, StoreError,
};
use chrono::Utc;
use tokio::sync::watch;

pub const PASSWORD: &str = "correct-horse";
pub const USER_ID: &str = "uid-1";
/// Refresh token handed out by every successful stub refresh.
pub const ROTATED_REFRESH: &str = "rotated-refresh";

/// Identity provider double with call counters.
pub struct StubIdentity {
    refresh_result: Result<String, AuthFailure>,
    refresh_delay: Duration,
    pub refresh_calls: AtomicUsize,
    pub sign_outs: AtomicUsize,
    pub restored: Mutex<Option<(String, String)>>,
}

impl StubIdentity {
    pub fn refreshing_to(token: &str) -> Self {
        Self::with_refresh(Ok(token.to_string()))
    }

    pub fn failing_refresh() -> Self {
        Self::with_refresh(Err(AuthFailure::NoSession))
    }

    fn with_refresh(refresh_result: Result<String, AuthFailure>) -> Self {
        Self {
            refresh_result,
            refresh_delay: Duration::ZERO,
            refresh_calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
            restored: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn session() -> ProviderSession {
        ProviderSession {
            id_token: "id-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            user_id: USER_ID.to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn sign_in(&self, _email: &str, secret: &str) -> Result<ProviderSession, AuthFailure> {
        if secret == PASSWORD {
            Ok(Self::session())
        } else {
            Err(AuthFailure::InvalidCredential)
        }
    }

    async fn sign_up(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthFailure> {
        if email == "taken@example.com" {
            Err(AuthFailure::EmailInUse)
        } else if secret.len() < 6 {
            Err(AuthFailure::WeakSecret)
        } else {
            Ok(Self::session())
        }
    }

    async fn sign_out(&self) -> Result<(), AuthFailure> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh_token(&self, _force: bool) -> Result<ProviderSession, AuthFailure> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        let id_token = self.refresh_result.clone()?;
        Ok(ProviderSession {
            id_token,
            refresh_token: ROTATED_REFRESH.to_string(),
            ..Self::session()
        })
    }

    async fn restore(&self, user_id: &str, refresh_token: &str) {
        *self.restored.lock().unwrap() = Some((user_id.to_string(), refresh_token.to_string()));
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthFailure> {
        if email.contains('@') {
            Ok(())
        } else {
            Err(AuthFailure::InvalidEmail)
        }
    }
}

/// Store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("keychain locked".to_string()))
    }
}

/// Memory store whose reads wait until the gate is opened.
pub struct GatedStore {
    inner: MemoryStore,
    open: watch::Sender<bool>,
}

impl GatedStore {
    pub fn new() -> Self {
        let (open, _) = watch::channel(false);
        Self {
            inner: MemoryStore::new(),
            open,
        }
    }

    pub fn open(&self) {
        self.open.send_replace(true);
    }
}

#[async_trait]
impl CredentialStore for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut rx = self.open.subscribe();
        rx.wait_for(|open| *open)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }
}

pub async fn signed_in_store(token: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    Credential::new(token, USER_ID)
        .save(store.as_ref())
        .await
        .unwrap();
    store
}

pub fn context(
    store: Arc<dyn CredentialStore>,
    identity: Arc<StubIdentity>,
) -> Arc<SessionContext> {
    Arc::new(SessionContext::new(store, identity))
}
