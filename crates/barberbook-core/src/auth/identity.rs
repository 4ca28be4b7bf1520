//! Identity provider abstraction and the Firebase Authentication REST
//! implementation.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Identity Toolkit endpoints (sign-in, sign-up, reset e-mails)
const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Secure Token endpoint (refresh token exchange)
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A cached ID token is reused until this close to its expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Signed-in state as reported by the provider.
#[derive(Clone)]
pub struct ProviderSession {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl ProviderSession {
    fn is_fresh(&self) -> bool {
        !self.id_token.is_empty()
            && Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Invalid e-mail or password")]
    InvalidCredential,

    #[error("Too many attempts - try again later")]
    Throttled,

    #[error("Password is too weak")]
    WeakSecret,

    #[error("E-mail already in use")]
    EmailInUse,

    #[error("Invalid e-mail address")]
    InvalidEmail,

    #[error("No signed-in user")]
    NoSession,

    #[error("Identity provider unreachable: {0}")]
    Network(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl AuthFailure {
    /// Map a provider error code (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`).
    pub fn from_code(code: &str) -> Self {
        let head = code.split(':').next().unwrap_or_default().trim();
        match head {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "USER_DISABLED" | "USER_NOT_FOUND" => AuthFailure::InvalidCredential,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" => {
                AuthFailure::NoSession
            }
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => AuthFailure::Throttled,
            "WEAK_PASSWORD" => AuthFailure::WeakSecret,
            "EMAIL_EXISTS" => AuthFailure::EmailInUse,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthFailure::InvalidEmail,
            _ => AuthFailure::Provider(code.to_string()),
        }
    }

    /// Message for a sign-in or registration form.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredential => "E-mail or password is incorrect.",
            AuthFailure::Throttled => "Too many attempts. Please wait and try again.",
            AuthFailure::WeakSecret => "The password must have at least 6 characters.",
            AuthFailure::EmailInUse => "This e-mail is already in use.",
            AuthFailure::InvalidEmail => "Invalid e-mail.",
            AuthFailure::NoSession => "Your session has ended. Please sign in again.",
            AuthFailure::Network(_) => "Could not reach the sign-in service.",
            AuthFailure::Provider(_) => "Could not complete the request. Please try again.",
        }
    }
}

impl From<reqwest::Error> for AuthFailure {
    fn from(e: reqwest::Error) -> Self {
        AuthFailure::Network(e.to_string())
    }
}

/// External authentication service consumed by the session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthFailure>;

    async fn sign_up(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthFailure>;

    async fn sign_out(&self) -> Result<(), AuthFailure>;

    /// Current session with a valid ID token; `force` bypasses any cached
    /// token. The returned refresh token may have been rotated.
    async fn refresh_token(&self, force: bool) -> Result<ProviderSession, AuthFailure>;

    /// Resume a session persisted by an earlier process.
    async fn restore(&self, user_id: &str, refresh_token: &str);

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthFailure>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    id_token: String,
    refresh_token: String,
    local_id: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn expiry_from(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.trim().parse::<i64>().unwrap_or(0);
    Utc::now() + chrono::Duration::seconds(secs)
}

/// Firebase Authentication over its REST API.
pub struct FirebaseIdentity {
    client: Client,
    api_key: String,
    auth_url: String,
    token_url: String,
    state: Mutex<Option<ProviderSession>>,
}

impl FirebaseIdentity {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_endpoints(api_key, DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL)
    }

    /// Point at other endpoints, e.g. the Firebase emulator.
    pub fn with_endpoints(
        api_key: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into().trim_end_matches('/').to_string(),
            state: Mutex::new(None),
        })
    }

    fn current(&self) -> Option<ProviderSession> {
        match self.state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, session: Option<ProviderSession>) {
        match self.state.lock() {
            Ok(mut state) => *state = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    async fn provider_error(response: reqwest::Response) -> AuthFailure {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => AuthFailure::from_code(&envelope.error.message),
            Err(_) => AuthFailure::Provider(format!("Status {}", status)),
        }
    }

    async fn password_call(
        &self,
        action: &str,
        email: &str,
        secret: &str,
    ) -> Result<ProviderSession, AuthFailure> {
        let url = format!("{}/accounts:{}", self.auth_url, action);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password: secret,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let parsed: PasswordResponse = response
            .json()
            .await
            .map_err(|e| AuthFailure::Provider(e.to_string()))?;

        let session = ProviderSession {
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            user_id: parsed.local_id,
            expires_at: expiry_from(&parsed.expires_in),
        };
        self.replace(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthFailure> {
        let session = self.password_call("signInWithPassword", email, secret).await?;
        info!(user_id = %session.user_id, "Signed in with identity provider");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, secret: &str) -> Result<ProviderSession, AuthFailure> {
        let session = self.password_call("signUp", email, secret).await?;
        info!(user_id = %session.user_id, "Account created with identity provider");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthFailure> {
        // Firebase has no server-side sign-out for password sessions.
        self.replace(None);
        Ok(())
    }

    async fn refresh_token(&self, force: bool) -> Result<ProviderSession, AuthFailure> {
        let current = self.current().ok_or(AuthFailure::NoSession)?;
        if !force && current.is_fresh() {
            return Ok(current);
        }

        debug!(user_id = %current.user_id, force, "Refreshing ID token");
        let url = format!("{}/token", self.token_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let failure = Self::provider_error(response).await;
            warn!(error = %failure, "Token refresh rejected");
            if failure == AuthFailure::NoSession {
                self.replace(None);
            }
            return Err(failure);
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthFailure::Provider(e.to_string()))?;

        let session = ProviderSession {
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            user_id: parsed.user_id,
            expires_at: expiry_from(&parsed.expires_in),
        };
        self.replace(Some(session.clone()));
        Ok(session)
    }

    async fn restore(&self, user_id: &str, refresh_token: &str) {
        if self.current().is_some() {
            return;
        }
        self.replace(Some(ProviderSession {
            id_token: String::new(),
            refresh_token: refresh_token.to_string(),
            user_id: user_id.to_string(),
            expires_at: Utc::now(),
        }));
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthFailure> {
        let url = format!("{}/accounts:sendOobCode", self.auth_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "requestType": "PASSWORD_RESET",
                "email": email,
            }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::provider_error(response).await)
        }
    }
}
