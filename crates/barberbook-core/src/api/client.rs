//! HTTP client for the barbershop REST API.
//!
//! Every request carries the stored bearer token when there is one. A 401
//! triggers exactly one recovery cycle: forced token refresh, then a single
//! retry with the new token. When that fails the stored credential is
//! cleared and the session emits `LoginRequired`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionContext;
use crate::config::Config;

use super::ApiError;

/// Clone is cheap - reqwest::Client and the session are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        Self::with_base_url(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
            session,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionContext>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn default_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Return the body of a successful response, or the mapped error.
    async fn finish(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.text().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Dispatch with the refresh-retry cycle; returns the raw response body.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let url = self.url(path);
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Validation(format!("Could not encode request: {}", e)))?;

        let token = self.session.token().await;
        debug!(%method, url = %url, authenticated = token.is_some(), "API request");
        let response = self
            .send(method.clone(), &url, body.as_ref(), token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::finish(response).await;
        }

        debug!(url = %url, "Unauthorized, refreshing token");
        let fresh = match self.session.refresh_after(token.as_deref()).await {
            Ok(fresh) => fresh,
            Err(e) => {
                // the session already dropped the credential
                debug!(error = %e, url = %url, "Token refresh failed");
                return Err(ApiError::Authorization);
            }
        };

        let retry = self.send(method, &url, body.as_ref(), Some(&fresh)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %url, "Still unauthorized after refresh, signing out");
            self.session.invalidate(Some(&fresh)).await;
            return Err(ApiError::Authorization);
        }
        Self::finish(retry).await
    }

    fn decode<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
        serde_json::from_str(text).map_err(|e| ApiError::schema(path, e))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.execute::<()>(Method::GET, path, None).await?;
        Self::decode(path, &text)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self.execute(Method::POST, path, Some(body)).await?;
        Self::decode(path, &text)
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self.execute(Method::PUT, path, Some(body)).await?;
        Self::decode(path, &text)
    }

    /// DELETE; whatever the backend echoes back is ignored.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthFailure, IdentityProvider, MemoryStore, ProviderSession};
    use async_trait::async_trait;

    struct NoIdentity;

    #[async_trait]
    impl IdentityProvider for NoIdentity {
        async fn sign_in(&self, _: &str, _: &str) -> Result<ProviderSession, AuthFailure> {
            Err(AuthFailure::InvalidCredential)
        }
        async fn sign_up(&self, _: &str, _: &str) -> Result<ProviderSession, AuthFailure> {
            Err(AuthFailure::InvalidCredential)
        }
        async fn sign_out(&self) -> Result<(), AuthFailure> {
            Ok(())
        }
        async fn refresh_token(&self, _: bool) -> Result<ProviderSession, AuthFailure> {
            Err(AuthFailure::NoSession)
        }
        async fn restore(&self, _: &str, _: &str) {}
        async fn send_password_reset(&self, _: &str) -> Result<(), AuthFailure> {
            Ok(())
        }
    }

    fn client(base: &str) -> ApiClient {
        let session = Arc::new(SessionContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NoIdentity),
        ));
        ApiClient::with_base_url(base, Duration::from_secs(1), session).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = client("http://localhost:5000/api/");
        assert_eq!(api.url("/servicos"), "http://localhost:5000/api/servicos");
        assert_eq!(api.url("agendamentos/1"), "http://localhost:5000/api/agendamentos/1");
    }

    #[test]
    fn test_decode_schema_mismatch() {
        let err = ApiClient::decode::<Vec<u32>>("/servicos", r#"{"not":"a list"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.contains("/servicos")));
    }
}
