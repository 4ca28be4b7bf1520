use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::credentials::{open_store, Credential, CredentialStore, StoreError};
use super::identity::{AuthFailure, FirebaseIdentity, IdentityProvider, ProviderSession};
use crate::config::Config;

/// Capacity of the session event channel. Slow subscribers skip ahead.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] AuthFailure),
}

/// Result of one credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub loading: bool,
    /// `None` until the first check resolves.
    pub authenticated: Option<bool>,
}

impl Session {
    pub const fn checking() -> Self {
        Self {
            loading: true,
            authenticated: None,
        }
    }

    pub const fn resolved(authenticated: bool) -> Self {
        Self {
            loading: false,
            authenticated: Some(authenticated),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    SignedOut,
    /// Stored credential was cleared after an unrecoverable 401.
    LoginRequired,
    TokenRefreshed,
}

/// Subscription to session events. Dropping it unsubscribes.
pub struct SessionEvents {
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionEvents {
    /// Next event, or `None` once the session context is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Outcome of the last refresh, read by requests queued behind it.
#[derive(Default)]
struct RefreshState {
    last_failure: Option<AuthFailure>,
}

/// Shared session state injected into the guard and the API client.
///
/// Owns the credential store chosen at start-up, the identity provider, and
/// the gate that coalesces concurrent token refreshes.
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
    identity: Arc<dyn IdentityProvider>,
    refresh_gate: Mutex<RefreshState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            identity,
            refresh_gate: Mutex::new(RefreshState::default()),
            events,
        }
    }

    /// Build the context for the configured platform and hand any persisted
    /// refresh token back to the provider.
    pub async fn from_config(config: &Config) -> anyhow::Result<Arc<Self>> {
        let api_key = config
            .firebase_api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No identity provider API key configured"))?;
        let identity = Arc::new(FirebaseIdentity::new(api_key)?);
        let context = Arc::new(Self::new(open_store(config)?, identity));
        context.restore().await;
        Ok(context)
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents {
            rx: self.events.subscribe(),
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub async fn credential(&self) -> Result<Option<Credential>, StoreError> {
        Credential::load(self.store.as_ref()).await
    }

    /// Credential check used by the guard. Store failures read as signed out.
    pub async fn check(&self) -> Session {
        match self.credential().await {
            Ok(credential) => Session::resolved(credential.is_some()),
            Err(e) => {
                warn!(error = %e, "Credential store unreadable, treating as signed out");
                Session::resolved(false)
            }
        }
    }

    /// Bearer token for outbound requests, if any.
    pub async fn token(&self) -> Option<String> {
        match self.store.get(super::credentials::TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Credential store unreadable, sending request without token");
                None
            }
        }
    }

    async fn establish(&self, session: ProviderSession) -> Result<Credential, AuthError> {
        let credential = Credential::from(session);
        {
            let mut gate = self.refresh_gate.lock().await;
            gate.last_failure = None;
            credential.save(self.store.as_ref()).await?;
        }
        self.emit(SessionEvent::SignedIn {
            user_id: credential.user_id.clone(),
        });
        Ok(credential)
    }

    pub async fn sign_in(&self, email: &str, secret: &str) -> Result<Credential, AuthError> {
        let session = self.identity.sign_in(email, secret).await?;
        self.establish(session).await
    }

    /// Create a provider account and sign it in. The backend client record is
    /// created by the caller with the returned user id.
    pub async fn register(&self, email: &str, secret: &str) -> Result<Credential, AuthError> {
        let session = self.identity.sign_up(email, secret).await?;
        self.establish(session).await
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "Identity provider sign-out failed");
        }
        Credential::clear(self.store.as_ref()).await?;
        info!("Signed out");
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.identity.send_password_reset(email).await?;
        Ok(())
    }

    /// Resume the provider session from a persisted refresh token.
    pub async fn restore(&self) {
        match self.credential().await {
            Ok(Some(credential)) => {
                if let Some(ref refresh) = credential.refresh_token {
                    self.identity.restore(&credential.user_id, refresh).await;
                    debug!(user_id = %credential.user_id, "Provider session restored");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read credential to restore session"),
        }
    }

    /// Force a token refresh after `rejected` was refused by the backend.
    ///
    /// Refreshes are serialized. A caller queued behind an in-flight refresh
    /// gets the token it stored, or its failure, without calling the
    /// provider again. A failed refresh clears the credential before the
    /// gate is released.
    pub async fn refresh_after(&self, rejected: Option<&str>) -> Result<String, AuthFailure> {
        let mut gate = self.refresh_gate.lock().await;

        match self.token().await {
            Some(current) if Some(current.as_str()) != rejected => {
                debug!("Reusing token from concurrent refresh");
                return Ok(current);
            }
            Some(_) => {}
            None => {
                if let Some(ref failure) = gate.last_failure {
                    debug!(error = %failure, "Refresh already failed, not retrying");
                    return Err(failure.clone());
                }
                if rejected.is_some() {
                    // cleared while this request was in flight
                    return Err(AuthFailure::NoSession);
                }
            }
        }

        match self.identity.refresh_token(true).await {
            Ok(session) => {
                gate.last_failure = None;
                let credential = Credential::from(session);
                if let Err(e) = credential.save(self.store.as_ref()).await {
                    warn!(error = %e, "Could not persist refreshed token");
                }
                info!("Token refreshed");
                self.emit(SessionEvent::TokenRefreshed);
                Ok(credential.token)
            }
            Err(failure) => {
                warn!(error = %failure, "Token refresh failed, signing out");
                gate.last_failure = Some(failure.clone());
                self.clear_session().await;
                Err(failure)
            }
        }
    }

    /// Drop the stored credential after the backend refused `rejected`
    /// even after a refresh.
    ///
    /// Does nothing when the credential is already gone or a newer token
    /// has been stored since, so a burst of rejected requests signs the
    /// user out once.
    pub async fn invalidate(&self, rejected: Option<&str>) {
        let _gate = self.refresh_gate.lock().await;
        match self.token().await {
            None => {
                debug!("Credential already cleared");
                return;
            }
            Some(current) if rejected.is_some() && Some(current.as_str()) != rejected => {
                debug!("Newer token stored, keeping credential");
                return;
            }
            Some(_) => {}
        }
        self.clear_session().await;
    }

    /// Caller holds the refresh gate.
    async fn clear_session(&self) {
        if let Err(e) = Credential::clear(self.store.as_ref()).await {
            warn!(error = %e, "Could not clear credential");
        }
        if let Err(e) = self.identity.sign_out().await {
            debug!(error = %e, "Provider sign-out after invalidation failed");
        }
        self.emit(SessionEvent::LoginRequired);
    }
}
